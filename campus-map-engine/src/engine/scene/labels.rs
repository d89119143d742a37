use bevy::prelude::*;
use bevy::render::primitives::Aabb;

use constants::render_settings::{
    BUILDING_LABEL_CLEARANCE, BUILDING_LABEL_FONT_SIZE, BUILDING_LABEL_HEIGHT, LABEL_BACKGROUND,
    LABEL_TEXT_COLOR, NODE_LABEL_FONT_SIZE, NODE_LABEL_HEIGHT,
};

use crate::engine::assets::map_data::{BuildingId, NodeId};
use crate::engine::assets::registry::MapRegistry;
use crate::engine::camera::orbit_controls::MapCamera;
use crate::engine::config::ViewerConfig;
use crate::engine::core::app_state::MapSceneEntity;
use crate::engine::flags::FeatureFlags;
use crate::engine::loading::building_loader::BuildingMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Building(BuildingId),
    Node(NodeId),
}

/// Screen-space text pinned to a world anchor.
#[derive(Component, Debug, Clone, Copy)]
pub struct WorldLabel {
    pub anchor: Vec3,
    pub kind: LabelKind,
}

fn label_bundle(text: String, font_size: f32, label: WorldLabel) -> impl Bundle {
    (
        label,
        MapSceneEntity,
        Text::new(text),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(LABEL_TEXT_COLOR),
        BackgroundColor(LABEL_BACKGROUND),
        Node {
            position_type: PositionType::Absolute,
            padding: UiRect::axes(Val::Px(6.0), Val::Px(2.0)),
            ..default()
        },
        Visibility::Hidden,
    )
}

pub fn spawn_building_labels(
    mut commands: Commands,
    registry: Res<MapRegistry>,
    config: Res<ViewerConfig>,
) {
    let mut spawned = 0;
    for building in registry.buildings() {
        if config.is_label_excluded(&building.name) {
            continue;
        }
        let Some(node) = registry.node(building.node_id) else {
            continue;
        };
        commands.spawn(label_bundle(
            building.name.clone(),
            BUILDING_LABEL_FONT_SIZE,
            WorldLabel {
                anchor: node.world_position(BUILDING_LABEL_HEIGHT),
                kind: LabelKind::Building(building.id),
            },
        ));
        spawned += 1;
    }
    info!("Spawned {} building labels", spawned);
}

/// Node id labels exist only while `showNodeLabels` is on.
pub fn sync_node_labels(
    mut commands: Commands,
    flags: Res<FeatureFlags>,
    registry: Option<Res<MapRegistry>>,
    labels: Query<(Entity, &WorldLabel)>,
) {
    let Some(registry) = registry else {
        return;
    };
    if !flags.is_changed() && !registry.is_changed() {
        return;
    }

    let node_labels: Vec<Entity> = labels
        .iter()
        .filter(|(_, label)| matches!(label.kind, LabelKind::Node(_)))
        .map(|(entity, _)| entity)
        .collect();

    if !flags.show_node_labels {
        for entity in node_labels {
            commands.entity(entity).despawn();
        }
        return;
    }
    if !node_labels.is_empty() {
        return;
    }

    for node in registry.nodes() {
        commands.spawn(label_bundle(
            node.id.to_string(),
            NODE_LABEL_FONT_SIZE,
            WorldLabel {
                anchor: node.world_position(NODE_LABEL_HEIGHT),
                kind: LabelKind::Node(node.id),
            },
        ));
    }
}

/// Lifts a building label above the model once its meshes have bounds.
pub fn lift_building_labels(
    meshes: Query<(&BuildingMesh, &GlobalTransform, &Aabb), Added<BuildingMesh>>,
    mut labels: Query<&mut WorldLabel>,
) {
    for (BuildingMesh(building_id), transform, aabb) in &meshes {
        let top = transform
            .transform_point(Vec3::from(aabb.center) + Vec3::Y * aabb.half_extents.y)
            .y
            + BUILDING_LABEL_CLEARANCE;

        for mut label in &mut labels {
            if label.kind == LabelKind::Building(*building_id) && top > label.anchor.y {
                label.anchor.y = top;
            }
        }
    }
}

/// Projects anchors to the viewport and centres each label on its anchor.
pub fn position_world_labels(
    flags: Res<FeatureFlags>,
    cameras: Query<(&Camera, &GlobalTransform), With<MapCamera>>,
    mut labels: Query<(&WorldLabel, &mut Node, &mut Visibility, &ComputedNode)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    for (label, mut node, mut visibility, computed) in &mut labels {
        let enabled = match label.kind {
            LabelKind::Building(_) => flags.show_building_labels,
            LabelKind::Node(_) => flags.show_node_labels,
        };
        let projected = enabled
            .then(|| camera.world_to_viewport(camera_transform, label.anchor).ok())
            .flatten();

        let Some(position) = projected else {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        };

        let size = computed.size() * computed.inverse_scale_factor();
        node.left = Val::Px(position.x - size.x * 0.5);
        node.top = Val::Px(position.y - size.y * 0.5);
        visibility.set_if_neq(Visibility::Inherited);
    }
}
