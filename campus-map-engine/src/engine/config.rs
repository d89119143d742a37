use bevy::asset::LoadState;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::camera::TOP_DOWN_DURATION_MS;
use constants::map::{
    ALL_CATEGORY_LABEL, BACKEND_URL_ENV, DEFAULT_BACKEND_URL, DEFAULT_INSTANCE_ID,
    DEFAULT_REMOTE_MODELS_URL, DEFAULT_SEARCH_LIMIT, LABEL_EXCLUDED_NAMES, TOTEM_ID, TOTEM_NAME,
    TOTEM_NODE_ID, VIEWER_CONFIG_PATH,
};

use crate::engine::assets::map_data::NodeId;
use crate::engine::assets::model_cache::{
    LocalModelSource, ModelCache, ModelSource, RemoteModelSource,
};
use crate::engine::backend::client::BackendClient;
use crate::engine::camera::sync::CameraSyncBus;
use crate::engine::core::app_state::AppState;
use crate::engine::flags::FeatureFlags;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSourceKind {
    #[default]
    Local,
    Remote,
}

/// Fixed kiosk location routes start from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotemLocation {
    pub id: String,
    pub name: String,
    pub node_id: NodeId,
}

impl Default for TotemLocation {
    fn default() -> Self {
        Self {
            id: TOTEM_ID.to_string(),
            name: TOTEM_NAME.to_string(),
            node_id: NodeId(TOTEM_NODE_ID),
        }
    }
}

/// Runtime configuration read from `config/totem.viewer.json`.
/// Every field is optional in the file.
#[derive(Asset, TypePath, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub backend_url: String,
    pub model_source: ModelSourceKind,
    pub feature_flags: FeatureFlags,
    pub totem: TotemLocation,
    pub camera_animation_ms: u32,
    pub animate_camera_on_route: bool,
    pub label_excluded_names: Vec<String>,
    pub all_category_label: String,
    pub instance_id: String,
    pub search_limit: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            model_source: ModelSourceKind::Local,
            feature_flags: FeatureFlags::default(),
            totem: TotemLocation::default(),
            camera_animation_ms: TOP_DOWN_DURATION_MS,
            animate_camera_on_route: true,
            label_excluded_names: LABEL_EXCLUDED_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            all_category_label: ALL_CATEGORY_LABEL.to_string(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ViewerConfig {
    /// Applies the `TOTEM_BACKEND_URL` override on native builds.
    pub fn with_env_overrides(mut self) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                info!("Backend url overridden by {}: {}", BACKEND_URL_ENV, url);
                self.backend_url = url;
            }
        }
        self
    }

    pub fn model_source(&self) -> Box<dyn ModelSource> {
        match self.model_source {
            ModelSourceKind::Local => Box::new(LocalModelSource),
            ModelSourceKind::Remote => Box::new(RemoteModelSource::new(remote_models_url())),
        }
    }

    pub fn is_label_excluded(&self, name: &str) -> bool {
        self.label_excluded_names
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(name.trim()))
    }
}

/// Root of the remote model host, fixed at build time.
pub fn remote_models_url() -> &'static str {
    option_env!("TOTEM_REMOTE_MODELS_URL").unwrap_or(DEFAULT_REMOTE_MODELS_URL)
}

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<ViewerConfig>>,
}

pub fn start_config_loading(mut loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    info!("Loading viewer config from {}", VIEWER_CONFIG_PATH);
    loader.handle = Some(asset_server.load(VIEWER_CONFIG_PATH));
}

/// Waits for the config asset, falling back to defaults when it is missing or invalid.
pub fn apply_viewer_config(
    loader: Res<ConfigLoader>,
    asset_server: Res<AssetServer>,
    configs: Res<Assets<ViewerConfig>>,
    mut commands: Commands,
    mut backend: ResMut<BackendClient>,
    mut model_cache: ResMut<ModelCache>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    let config = if let Some(config) = configs.get(handle) {
        config.clone()
    } else if let Some(LoadState::Failed(error)) = asset_server.get_load_state(handle.id()) {
        warn!("Viewer config unavailable ({}), using defaults", error);
        ViewerConfig::default()
    } else {
        return;
    };

    install_config(config.with_env_overrides(), &mut commands, &mut backend, &mut model_cache);
    println!("→ Viewer config ready, transitioning to LoadingMap state");
    next_state.set(AppState::LoadingMap);
}

pub fn install_config(
    config: ViewerConfig,
    commands: &mut Commands,
    backend: &mut BackendClient,
    model_cache: &mut ModelCache,
) {
    info!(
        "Backend {} | models {:?} | totem node {}",
        config.backend_url, config.model_source, config.totem.node_id
    );
    backend.set_base_url(config.backend_url.clone());
    model_cache.set_source(config.model_source());
    commands.insert_resource(config.feature_flags);
    commands.insert_resource(CameraSyncBus::new(config.instance_id.clone()));
    commands.insert_resource(config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.totem.node_id, NodeId(47));
        assert_eq!(config.search_limit, 5);
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{
                "backendUrl": "https://api.campus.example",
                "modelSource": "remote",
                "featureFlags": {"showGraphEdges": true},
                "totem": {"id": "t2", "name": "Totem 2", "nodeId": 12}
            }"#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "https://api.campus.example");
        assert_eq!(config.model_source, ModelSourceKind::Remote);
        assert!(config.feature_flags.show_graph_edges);
        assert!(config.feature_flags.enable_camera_animation);
        assert_eq!(config.totem.node_id, NodeId(12));
        assert_eq!(config.model_source().name(), "remote");
    }

    #[test]
    fn label_exclusion_ignores_case() {
        let config = ViewerConfig::default();
        assert!(config.is_label_excluded("TECNOPUC"));
        assert!(!config.is_label_excluded("Predio 32"));
    }
}
