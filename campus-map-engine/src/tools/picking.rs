use bevy::ecs::system::{SystemId, SystemParam};
use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde_json::json;

use constants::camera::CLICK_SLOP_PX;

use crate::engine::assets::map_data::BuildingId;
use crate::engine::camera::orbit_controls::MapCamera;
use crate::engine::loading::building_loader::BuildingMeshIndex;
use crate::engine::map_api::MapApi;
use crate::rpc::web_rpc::WebRpcInterface;

/// Sample points per axis for rectangle queries, edges included.
const RECT_SAMPLES: usize = 11;

/// Screen-space queries against building meshes.
#[derive(SystemParam)]
pub struct BuildingPicker<'w, 's> {
    windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<MapCamera>>,
    mesh_index: Res<'w, BuildingMeshIndex>,
    ray_cast: MeshRayCast<'w, 's>,
}

impl BuildingPicker<'_, '_> {
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.windows.single().ok()?.cursor_position()
    }

    /// Nearest building under a viewport position, in logical pixels.
    pub fn building_at(&mut self, viewport_position: Vec2) -> Option<BuildingId> {
        let (camera, camera_transform) = self.cameras.single().ok()?;
        let ray = camera
            .viewport_to_world(camera_transform, viewport_position)
            .ok()?;
        self.first_building_hit(ray)
    }

    /// Building owning the first triangle the ray hits. Meshes outside the
    /// building index are ignored and never block.
    pub fn first_building_hit(&mut self, ray: Ray3d) -> Option<BuildingId> {
        let index = &self.mesh_index;
        let is_building = |entity: Entity| index.building_for(entity).is_some();
        let settings = MeshRayCastSettings::default()
            .with_visibility(RayCastVisibility::Any)
            .with_filter(&is_building);

        let (entity, hit) = self.ray_cast.cast_ray(ray, &settings).first()?;
        debug!("Ray hit mesh {} at {:.1}", entity, hit.distance);
        index.building_for(*entity)
    }

    pub fn has_intersection(&mut self, viewport_position: Vec2) -> bool {
        self.building_at(viewport_position).is_some()
    }

    /// Distinct buildings found on an 11x11 sample grid over the rectangle.
    pub fn buildings_in_rect(&mut self, corner_a: Vec2, corner_b: Vec2) -> Vec<BuildingId> {
        let mut found = Vec::new();
        for sample in rect_samples(corner_a, corner_b) {
            if let Some(id) = self.building_at(sample) {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        found
    }
}

/// Evenly spaced sample points covering the rectangle, edges included.
pub fn rect_samples(corner_a: Vec2, corner_b: Vec2) -> impl Iterator<Item = Vec2> {
    let min = corner_a.min(corner_b);
    let size = corner_a.max(corner_b) - min;
    let step = size / (RECT_SAMPLES - 1) as f32;
    (0..RECT_SAMPLES).flat_map(move |row| {
        (0..RECT_SAMPLES).map(move |column| min + step * Vec2::new(column as f32, row as f32))
    })
}

/// A press and release close enough together to count as a click.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerClick {
    pub position: Vec2,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BuildingClicked {
    pub building_id: BuildingId,
    pub screen_position: Vec2,
}

/// Single click callback. Registering replaces the previous one.
#[derive(Resource, Debug, Default)]
pub struct BuildingClickHandler {
    callback: Option<SystemId<In<BuildingId>>>,
}

impl BuildingClickHandler {
    pub fn with_callback(callback: SystemId<In<BuildingId>>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn register(
        &mut self,
        callback: SystemId<In<BuildingId>>,
    ) -> Option<SystemId<In<BuildingId>>> {
        self.callback.replace(callback)
    }

    pub fn clear(&mut self) -> Option<SystemId<In<BuildingId>>> {
        self.callback.take()
    }

    pub fn callback(&self) -> Option<SystemId<In<BuildingId>>> {
        self.callback
    }
}

/// Default click action: outline the clicked building.
pub fn highlight_clicked_building(In(building_id): In<BuildingId>, mut api: MapApi) {
    api.highlight_building(building_id);
}

pub fn detect_pointer_clicks(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut press: Local<Option<Vec2>>,
    mut clicks: EventWriter<PointerClick>,
) {
    let cursor = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position());

    if buttons.just_pressed(MouseButton::Left) {
        *press = cursor;
    }
    if buttons.just_released(MouseButton::Left) {
        if let (Some(start), Some(end)) = (press.take(), cursor) {
            if start.distance(end) <= CLICK_SLOP_PX {
                clicks.write(PointerClick { position: end });
            }
        }
    }

    for touch in touches.iter_just_released() {
        if touch.start_position().distance(touch.position()) <= CLICK_SLOP_PX {
            clicks.write(PointerClick {
                position: touch.position(),
            });
        }
    }
}

pub fn resolve_building_clicks(
    mut commands: Commands,
    mut clicks: EventReader<PointerClick>,
    mut picker: BuildingPicker,
    handler: Res<BuildingClickHandler>,
    mut clicked: EventWriter<BuildingClicked>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for click in clicks.read() {
        let Some(building_id) = picker.building_at(click.position) else {
            continue;
        };
        debug!("Building {} clicked", building_id);

        clicked.write(BuildingClicked {
            building_id,
            screen_position: click.position,
        });
        rpc_interface.send_notification(
            "building_clicked",
            json!({
                "buildingId": building_id,
                "x": click.position.x,
                "y": click.position.y,
            }),
        );
        if let Some(callback) = handler.callback() {
            commands.run_system_with(callback, building_id);
        }
    }
}
