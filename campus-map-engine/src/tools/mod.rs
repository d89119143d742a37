//! Interactive map tools driven by the page or by touch input.
//!
//! Every tool keeps its state in a resource and is changed through
//! [`MapApi`](crate::engine::map_api::MapApi); rendering systems mirror that
//! state into entities.
//!
//! ## Click Flow
//!
//! ```text
//! Mouse/Touch release within slop
//!   └─> PointerClick
//!       └─> resolve_building_clicks()
//!           ├─> Ray vs building mesh triangles (nearest wins)
//!           ├─> BuildingClicked event + `building_clicked` notification
//!           └─> Registered click callback (default: highlight)
//! ```
//!
//! ## Route Flow
//!
//! ```text
//! route_to_destination RPC
//!   └─> GET /routes?fromNodeId=&toNodeId=
//!       └─> RouteFetched
//!           ├─> found:     RouteTracer::trace_route + optional top-down animation
//!           ├─> 404:       `route_not_found`
//!           └─> failure:   `route_failed`
//! ```

use bevy::prelude::*;

/// Category index derived from the company directory.
pub mod categories;

/// Outline highlighting of one or more buildings.
pub mod highlighter;

/// Screen-space picking of buildings and the single click callback.
pub mod picking;

/// Backend route lookups from the totem to a destination.
pub mod route_search;

/// Route ribbons drawn over the road network.
pub mod route_tracer;

/// Destination search over buildings and companies.
pub mod search;

use categories::CategoryIndex;
use highlighter::{HighlightState, sync_highlight_outlines};
use picking::{
    BuildingClickHandler, BuildingClicked, PointerClick, detect_pointer_clicks,
    highlight_clicked_building, resolve_building_clicks,
};
use route_search::receive_routes;
use route_tracer::{RouteReveal, RouteTracer, render_route, reveal_route};
use search::{SearchIndex, rebuild_destination_indexes};

/// Registers tool state, events and systems.
pub struct MapToolsPlugin;

impl Plugin for MapToolsPlugin {
    fn build(&self, app: &mut App) {
        let default_click = app.register_system(highlight_clicked_building);

        app.init_resource::<HighlightState>()
            .init_resource::<RouteTracer>()
            .init_resource::<RouteReveal>()
            .init_resource::<SearchIndex>()
            .init_resource::<CategoryIndex>()
            .insert_resource(BuildingClickHandler::with_callback(default_click))
            .add_event::<PointerClick>()
            .add_event::<BuildingClicked>()
            .add_systems(
                Update,
                (
                    (detect_pointer_clicks, resolve_building_clicks).chain(),
                    receive_routes,
                    (render_route, reveal_route).chain(),
                    sync_highlight_outlines,
                    rebuild_destination_indexes,
                ),
            );
    }
}
