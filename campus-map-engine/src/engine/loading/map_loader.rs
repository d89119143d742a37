use bevy::prelude::*;

use crate::engine::assets::company::CompanyDirectory;
use crate::engine::assets::model_cache::ModelCache;
use crate::engine::assets::registry::MapRegistry;
use crate::engine::backend::client::{
    BackendClient, BackendRequest, CompaniesFetched, MapDataFetched,
};
use crate::engine::core::app_state::{
    AppState, MapSceneEntity, ReloadMapRequest, transition_to_load_failed, transition_to_running,
};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::highlighter::HighlightState;
use crate::tools::route_tracer::RouteTracer;

use super::building_loader::{BuildingMeshIndex, SpawnedBuildings};
use super::progress::LoadingProgress;

/// Override url for the next `/map` request, set by reloads.
#[derive(Resource, Debug, Default)]
pub struct PendingMapRequest {
    pub url: Option<String>,
}

pub fn request_map_data(
    backend: Res<BackendClient>,
    mut pending: ResMut<PendingMapRequest>,
    mut directory: ResMut<CompanyDirectory>,
) {
    let url = pending.url.take();
    info!(
        "Requesting map data from {}",
        url.as_deref().unwrap_or(backend.base_url())
    );
    backend.request(BackendRequest::MapData { url });

    if directory.begin_fetch(false) {
        backend.request(BackendRequest::Companies);
    }
}

pub fn receive_map_data(
    mut events: EventReader<MapDataFetched>,
    mut commands: Commands,
    mut next_state: ResMut<NextState<AppState>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let Some(event) = events.read().last() else {
        return;
    };

    match &event.0 {
        Ok(data) => {
            info!(
                "Map data loaded: {} buildings, {} nodes, {} edges",
                data.buildings.len(),
                data.nodes.len(),
                data.edges.len()
            );
            rpc_interface.send_notification(
                "map_loaded",
                serde_json::json!({
                    "buildings": data.buildings.len(),
                    "nodes": data.nodes.len(),
                    "edges": data.edges.len(),
                }),
            );
            commands.insert_resource(MapRegistry::new(data.clone()));
            transition_to_running(&mut next_state);
        }
        Err(error) => {
            error!("Failed to load map data: {}", error);
            rpc_interface.send_notification(
                "map_load_failed",
                serde_json::json!({ "error": error.to_string() }),
            );
            transition_to_load_failed(&mut next_state);
        }
    }
}

pub fn receive_companies(
    mut events: EventReader<CompaniesFetched>,
    mut directory: ResMut<CompanyDirectory>,
    time: Res<Time>,
) {
    for event in events.read() {
        match &event.0 {
            Ok(companies) => directory.store(companies.clone(), time.elapsed_secs_f64()),
            Err(error) => {
                warn!("Company list unavailable: {}", error);
                directory.fail(error.to_string());
            }
        }
    }
}

/// Tears the current map down and re-enters `LoadingMap`.
pub fn handle_reload_requests(
    mut requests: EventReader<ReloadMapRequest>,
    mut commands: Commands,
    scene: Query<Entity, With<MapSceneEntity>>,
    mut pending: ResMut<PendingMapRequest>,
    mut highlight: ResMut<HighlightState>,
    mut route: ResMut<RouteTracer>,
    mut mesh_index: ResMut<BuildingMeshIndex>,
    mut spawned: ResMut<SpawnedBuildings>,
    mut model_cache: ResMut<ModelCache>,
    mut progress: ResMut<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(request) = requests.read().last() else {
        return;
    };

    info!(
        "Reloading map{}",
        request
            .url
            .as_deref()
            .map(|url| format!(" from {url}"))
            .unwrap_or_default()
    );

    for entity in &scene {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<MapRegistry>();
    highlight.clear();
    route.clear_route();
    mesh_index.clear();
    spawned.clear();
    model_cache.clear();
    *progress = LoadingProgress::default();

    pending.url = request.url.clone();
    next_state.set(AppState::LoadingMap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::client::testing::StaticTransport;
    use crate::engine::backend::client::BackendPlugin;
    use bevy::state::app::StatesPlugin;

    const MAP: &str = r#"{
        "nodes": [{"id": 1, "x": 0, "y": 0}, {"id": 2, "x": 10, "y": 0}],
        "edges": [{"id": 1, "aNodeId": 1, "bNodeId": 2}],
        "buildings": []
    }"#;

    fn loader_app(transport: StaticTransport) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_resource(BackendClient::new("http://api", transport))
            .add_plugins(BackendPlugin)
            .init_state::<AppState>()
            .init_resource::<PendingMapRequest>()
            .init_resource::<CompanyDirectory>()
            .init_resource::<WebRpcInterface>()
            .add_systems(OnEnter(AppState::LoadingMap), request_map_data)
            .add_systems(
                Update,
                (receive_map_data.run_if(in_state(AppState::LoadingMap)), receive_companies),
            );
        app
    }

    fn enter_loading_map(app: &mut App) {
        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::LoadingMap);
        // transition + request, replies drained, then handled
        for _ in 0..4 {
            app.update();
        }
    }

    #[test]
    fn valid_map_inserts_registry_and_moves_to_running() {
        let transport = StaticTransport::default()
            .with("http://api/map", 200, MAP)
            .with("http://api/companies", 200, "[]");
        let mut app = loader_app(transport);
        enter_loading_map(&mut app);

        let registry = app.world().resource::<MapRegistry>();
        assert_eq!(registry.nodes().len(), 2);
        assert_eq!(
            *app.world().resource::<State<AppState>>().get(),
            AppState::Running
        );
        assert!(app.world().resource::<CompanyDirectory>().is_loaded());
    }

    #[test]
    fn invalid_map_fails_the_load() {
        let transport = StaticTransport::default()
            .with("http://api/map", 200, r#"{"nodes": [], "edges": []}"#)
            .with("http://api/companies", 503, "");
        let mut app = loader_app(transport);
        enter_loading_map(&mut app);

        assert!(!app.world().contains_resource::<MapRegistry>());
        assert_eq!(
            *app.world().resource::<State<AppState>>().get(),
            AppState::LoadFailed
        );
        let directory = app.world().resource::<CompanyDirectory>();
        assert!(!directory.is_loaded());
        assert!(directory.last_error().is_some());
        let sent = app.world().resource::<WebRpcInterface>().pending_notifications();
        assert!(sent.iter().any(|n| n.method == "map_load_failed"));
    }
}
