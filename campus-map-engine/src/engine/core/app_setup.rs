use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::LogPlugin;
use bevy::pbr::wireframe::{WireframeConfig, WireframePlugin};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

use crate::engine::assets::company::CompanyDirectory;
use crate::engine::assets::model_cache::ModelCache;
use crate::engine::backend::client::BackendPlugin;
use crate::engine::camera::animator::{
    CameraAnimationEnded, CameraAnimator, drive_camera_animation,
};
use crate::engine::camera::orbit_controls::{OrbitControls, orbit_camera_controller};
use crate::engine::camera::setup::{adapt_fov_to_window, spawn_map_camera};
use crate::engine::camera::sync::{
    CameraSetMessage, CameraSyncBus, apply_camera_messages, publish_camera_changes,
};
use crate::engine::config::{ConfigLoader, ViewerConfig, apply_viewer_config, start_config_loading};
use crate::engine::core::app_state::{AppState, ReloadMapRequest};
use crate::engine::core::window_config::create_window_config;
use crate::engine::flags::FeatureFlags;
use crate::engine::loading::building_loader::{
    BuildingMeshIndex, SpawnedBuildings, spawn_buildings, tag_building_meshes, track_model_loads,
};
use crate::engine::loading::map_loader::{
    PendingMapRequest, handle_reload_requests, receive_companies, receive_map_data,
    request_map_data,
};
use crate::engine::loading::progress::{LoadingProgress, notify_loading_progress};
use crate::engine::scene::graph::draw_graph_gizmos;
use crate::engine::scene::ground::{GroundTexture, attach_grass_texture, spawn_ground};
use crate::engine::scene::labels::{
    lift_building_labels, position_world_labels, spawn_building_labels, sync_node_labels,
};
use crate::engine::scene::lighting::setup_lighting;
use crate::engine::scene::location_marker::spawn_location_marker;
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::rpc::notifications::{notify_camera_animation_end, notify_feature_flag_changes};
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::MapToolsPlugin;

const LOG_FILTER: &str = "info,wgpu=error,naga=warn,campus_map_engine=debug";

pub fn create_app() -> App {
    let mut app = App::new();

    // Asset sources must exist before the asset plugin is built.
    #[cfg(target_arch = "wasm32")]
    register_remote_model_source(&mut app);

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers ViewerConfig as a loadable asset type from `*.viewer.json` files.
        .add_plugins(JsonAssetPlugin::<ViewerConfig>::new(&["viewer.json"]))
        .add_plugins(WireframePlugin::default())
        .insert_resource(WireframeConfig {
            global: false,
            default_color: Color::WHITE,
        })
        .add_plugins(BackendPlugin)
        .add_plugins(WebRpcPlugin)
        .add_plugins(MapToolsPlugin);

    // Initialise resources early
    app.init_resource::<ConfigLoader>()
        .init_resource::<ViewerConfig>()
        .init_resource::<FeatureFlags>()
        .init_resource::<ModelCache>()
        .init_resource::<CompanyDirectory>()
        .init_resource::<PendingMapRequest>()
        .init_resource::<SpawnedBuildings>()
        .init_resource::<BuildingMeshIndex>()
        .init_resource::<LoadingProgress>()
        .init_resource::<GroundTexture>()
        .init_resource::<OrbitControls>()
        .init_resource::<CameraAnimator>()
        .init_resource::<CameraSyncBus>()
        .add_event::<ReloadMapRequest>()
        .add_event::<CameraSetMessage>()
        .add_event::<CameraAnimationEnded>();

    // State-based system scheduling
    app.add_systems(
        Startup,
        (setup_lighting, spawn_map_camera, start_config_loading),
    )
    .add_systems(
        Update,
        apply_viewer_config.run_if(in_state(AppState::LoadingConfig)),
    )
    .add_systems(OnEnter(AppState::LoadingMap), request_map_data)
    .add_systems(
        Update,
        receive_map_data.run_if(in_state(AppState::LoadingMap)),
    )
    .add_systems(
        OnEnter(AppState::Running),
        (
            spawn_ground,
            spawn_buildings,
            spawn_building_labels,
            spawn_location_marker,
        )
            .chain(),
    );

    // Camera: the animation driver owns the camera before user input is read.
    app.add_systems(
        Update,
        (
            drive_camera_animation,
            orbit_camera_controller,
            publish_camera_changes,
            apply_camera_messages,
            notify_camera_animation_end,
        )
            .chain(),
    )
    .add_systems(Update, adapt_fov_to_window);

    // Map content, only meaningful once a map is loaded.
    let runtime_systems = (
        track_model_loads,
        tag_building_meshes,
        lift_building_labels.after(tag_building_meshes),
        notify_loading_progress,
        attach_grass_texture,
        draw_graph_gizmos,
    );
    app.add_systems(Update, runtime_systems.run_if(in_state(AppState::Running)));

    // Lifecycle and page-facing systems that run in every state.
    app.add_systems(
        Update,
        (
            receive_companies,
            handle_reload_requests,
            sync_node_labels,
            position_world_labels,
            notify_feature_flag_changes,
            fps_notification_system,
        ),
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        use crate::engine::systems::fps_tracking::{fps_text_update_system, spawn_fps_overlay};
        app.add_systems(Startup, spawn_fps_overlay)
            .add_systems(Update, fps_text_update_system);
    }

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}

#[cfg(target_arch = "wasm32")]
fn register_remote_model_source(app: &mut App) {
    use bevy::asset::io::AssetSource;
    use bevy::asset::io::wasm::HttpWasmAssetReader;
    use constants::map::REMOTE_MODEL_SOURCE;

    let root = crate::engine::config::remote_models_url();
    info!("Remote models served from {}", root);
    app.register_asset_source(
        REMOTE_MODEL_SOURCE,
        AssetSource::build().with_reader(move || Box::new(HttpWasmAssetReader::new(root))),
    );
}
