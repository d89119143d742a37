use bevy::pbr::CascadeShadowConfigBuilder;
use bevy::prelude::*;

use constants::render_settings::{
    AMBIENT_BRIGHTNESS, CLEAR_COLOR, FILL_ILLUMINANCE, SHADOW_EXTENT, SUN_ILLUMINANCE,
};

pub fn setup_lighting(mut commands: Commands) {
    commands.insert_resource(ClearColor(CLEAR_COLOR));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: SUN_ILLUMINANCE,
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            maximum_distance: SHADOW_EXTENT * 2.0,
            ..default()
        }
        .build(),
        Transform::from_xyz(30.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Name::new("Fill light"),
        DirectionalLight {
            illuminance: FILL_ILLUMINANCE,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-20.0, 40.0, -30.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
