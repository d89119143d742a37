//! Headless app preloaded with the sample map, shared by system-level tests.

use bevy::diagnostic::DiagnosticsStore;
use bevy::prelude::*;

use constants::camera::INITIAL_CAMERA_POSITION;

use crate::engine::assets::company::CompanyDirectory;
use crate::engine::assets::registry::sample_registry;
use crate::engine::backend::client::BackendClient;
use crate::engine::backend::client::testing::StaticTransport;
use crate::engine::camera::animator::{CameraAnimationEnded, CameraAnimator};
use crate::engine::camera::orbit_controls::{MapCamera, OrbitControls};
use crate::engine::camera::sync::{CameraSetMessage, CameraSyncBus};
use crate::engine::config::ViewerConfig;
use crate::engine::core::app_state::ReloadMapRequest;
use crate::engine::flags::FeatureFlags;
use crate::engine::loading::building_loader::{BuildingMeshIndex, SpawnedBuildings};
use crate::rpc::web_rpc::{IncomingRpcMessage, WebRpcInterface};
use crate::tools::categories::CategoryIndex;
use crate::tools::highlighter::HighlightState;
use crate::tools::route_tracer::RouteTracer;
use crate::tools::search::SearchIndex;

pub const TEST_BACKEND_URL: &str = "http://backend.test";

pub fn map_test_app_with_transport(transport: StaticTransport) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(sample_registry())
        .insert_resource(BackendClient::new(TEST_BACKEND_URL, transport))
        .init_resource::<ViewerConfig>()
        .init_resource::<FeatureFlags>()
        .init_resource::<HighlightState>()
        .init_resource::<RouteTracer>()
        .init_resource::<CameraAnimator>()
        .init_resource::<OrbitControls>()
        .init_resource::<SpawnedBuildings>()
        .init_resource::<BuildingMeshIndex>()
        .init_resource::<Assets<Mesh>>()
        .init_resource::<SearchIndex>()
        .init_resource::<CategoryIndex>()
        .init_resource::<CompanyDirectory>()
        .init_resource::<CameraSyncBus>()
        .init_resource::<DiagnosticsStore>()
        .init_resource::<WebRpcInterface>()
        .add_event::<CameraSetMessage>()
        .add_event::<CameraAnimationEnded>()
        .add_event::<ReloadMapRequest>()
        .add_event::<IncomingRpcMessage>();

    app.world_mut().spawn((
        MapCamera,
        Transform::from_translation(INITIAL_CAMERA_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    app
}

pub fn map_test_app() -> App {
    map_test_app_with_transport(StaticTransport::default())
}
