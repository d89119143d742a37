use bevy::prelude::*;

use constants::render_settings::{
    GRAPH_EDGE_COLOR, GRAPH_EDGE_HEIGHT, GRAPH_NODE_COLOR, GRAPH_NODE_HEIGHT, GRAPH_NODE_RADIUS,
};

use crate::engine::assets::registry::MapRegistry;
use crate::engine::flags::FeatureFlags;

/// Debug overlay of the navigation graph, redrawn every frame while enabled.
pub fn draw_graph_gizmos(
    flags: Res<FeatureFlags>,
    registry: Option<Res<MapRegistry>>,
    mut gizmos: Gizmos,
) {
    let Some(registry) = registry else {
        return;
    };

    if flags.show_graph_edges {
        for (from, to) in registry.edge_segments() {
            gizmos.line(
                Vec3::new(from.x, GRAPH_EDGE_HEIGHT, from.y),
                Vec3::new(to.x, GRAPH_EDGE_HEIGHT, to.y),
                GRAPH_EDGE_COLOR,
            );
        }
    }

    if flags.show_graph_nodes {
        for node in registry.nodes() {
            gizmos.sphere(
                Isometry3d::from_translation(node.world_position(GRAPH_NODE_HEIGHT)),
                GRAPH_NODE_RADIUS,
                GRAPH_NODE_COLOR,
            );
        }
    }
}
