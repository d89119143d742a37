use bevy::prelude::*;

use constants::render_settings::{
    LOCATION_MARKER_COLOR, LOCATION_MARKER_HEIGHT, LOCATION_MARKER_SCALE,
};

use crate::engine::assets::registry::MapRegistry;
use crate::engine::config::ViewerConfig;
use crate::engine::core::app_state::MapSceneEntity;

#[derive(Component, Debug)]
pub struct CurrentLocationMarker;

/// Red pin above the totem's node.
pub fn spawn_location_marker(
    mut commands: Commands,
    registry: Res<MapRegistry>,
    config: Res<ViewerConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(node) = registry.node(config.totem.node_id) else {
        warn!(
            "Totem node {} not in map, location marker skipped",
            config.totem.node_id
        );
        return;
    };

    let material = materials.add(StandardMaterial {
        base_color: LOCATION_MARKER_COLOR,
        perceptual_roughness: 0.4,
        ..default()
    });
    let head = meshes.add(Sphere::new(0.35));
    let tip = meshes.add(Cone {
        radius: 0.2,
        height: 0.6,
    });

    commands
        .spawn((
            Name::new(config.totem.name.clone()),
            CurrentLocationMarker,
            MapSceneEntity,
            Transform::from_translation(node.world_position(LOCATION_MARKER_HEIGHT))
                .with_scale(Vec3::splat(LOCATION_MARKER_SCALE)),
            Visibility::default(),
        ))
        .with_children(|pin| {
            pin.spawn((
                Mesh3d(head),
                MeshMaterial3d(material.clone()),
                Transform::from_xyz(0.0, 0.3, 0.0),
            ));
            pin.spawn((
                Mesh3d(tip),
                MeshMaterial3d(material),
                Transform::from_xyz(0.0, -0.3, 0.0)
                    .with_rotation(Quat::from_rotation_x(std::f32::consts::PI)),
            ));
        });

    info!("Current location marker placed at node {}", node.id);
}
