use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use thiserror::Error;

use constants::map::REMOTE_MODEL_SOURCE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelSourceError {
    #[error("model path is empty")]
    EmptyPath,
    #[error("model url {url} is not served by {base_url}")]
    ForeignUrl { url: String, base_url: String },
    #[error("remote models are only available in web builds (requested {0})")]
    RemoteUnavailable(String),
}

/// Strategy turning a `modelPath` from the map payload into an asset path.
pub trait ModelSource: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn resolve(&self, model_path: &str) -> Result<String, ModelSourceError>;
}

/// Models bundled under the local asset root.
#[derive(Debug, Default, Clone)]
pub struct LocalModelSource;

impl ModelSource for LocalModelSource {
    fn name(&self) -> &'static str {
        "local"
    }

    fn resolve(&self, model_path: &str) -> Result<String, ModelSourceError> {
        let path = model_path.trim().trim_start_matches('/');
        if path.is_empty() {
            return Err(ModelSourceError::EmptyPath);
        }
        Ok(path.to_string())
    }
}

/// Models fetched from the remote model host through the `remote://` asset source.
#[derive(Debug, Clone)]
pub struct RemoteModelSource {
    base_url: String,
}

impl RemoteModelSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ModelSource for RemoteModelSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn resolve(&self, model_path: &str) -> Result<String, ModelSourceError> {
        let relative = remote_relative_path(&self.base_url, model_path)?;

        #[cfg(target_arch = "wasm32")]
        {
            Ok(format!("{REMOTE_MODEL_SOURCE}://{relative}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Err(ModelSourceError::RemoteUnavailable(format!(
                "{REMOTE_MODEL_SOURCE}://{relative}"
            )))
        }
    }
}

/// Path of `model_path` relative to the remote host root. Absolute URLs are
/// accepted only when they point at `base_url`.
pub fn remote_relative_path(base_url: &str, model_path: &str) -> Result<String, ModelSourceError> {
    let model_path = model_path.trim();
    let relative = if model_path.starts_with("http://") || model_path.starts_with("https://") {
        let base = base_url.trim_end_matches('/');
        model_path
            .strip_prefix(base)
            .ok_or_else(|| ModelSourceError::ForeignUrl {
                url: model_path.to_string(),
                base_url: base_url.to_string(),
            })?
    } else {
        model_path
    };

    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return Err(ModelSourceError::EmptyPath);
    }
    Ok(relative.to_string())
}

/// Handles to a loaded glTF file and its default scene.
#[derive(Debug, Clone)]
pub struct CachedModel {
    pub gltf: Handle<Gltf>,
    pub scene: Handle<Scene>,
}

pub fn load_gltf(asset_server: &AssetServer, resolved: &str) -> CachedModel {
    CachedModel {
        gltf: asset_server.load(resolved.to_string()),
        scene: asset_server.load(GltfAssetLabel::Scene(0).from_asset(resolved.to_string())),
    }
}

/// Path-keyed model cache. Each model path is requested from the asset
/// server once; every spawn gets its own scene instance.
#[derive(Resource)]
pub struct ModelCache {
    source: Box<dyn ModelSource>,
    models: HashMap<String, CachedModel>,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(LocalModelSource)
    }
}

impl ModelCache {
    pub fn new(source: impl ModelSource) -> Self {
        Self {
            source: Box::new(source),
            models: HashMap::new(),
        }
    }

    /// Swaps the source strategy. Cached handles belong to the old source and are dropped.
    pub fn set_source(&mut self, source: Box<dyn ModelSource>) {
        info!("Model source set to {}", source.name());
        self.source = source;
        self.models.clear();
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Returns the cached model for `model_path`, loading it with `load` on first use.
    pub fn model(
        &mut self,
        model_path: &str,
        load: impl FnOnce(&str) -> CachedModel,
    ) -> Result<CachedModel, ModelSourceError> {
        if let Some(cached) = self.models.get(model_path) {
            return Ok(cached.clone());
        }

        let resolved = self.source.resolve(model_path)?;
        debug!("Loading model {} from {}", model_path, resolved);
        let model = load(&resolved);
        self.models.insert(model_path.to_string(), model.clone());
        Ok(model)
    }

    pub fn load(
        &mut self,
        model_path: &str,
        asset_server: &AssetServer,
    ) -> Result<CachedModel, ModelSourceError> {
        self.model(model_path, |resolved| load_gltf(asset_server, resolved))
    }

    /// Spawns a fresh scene instance of the model at `transform`.
    pub fn spawn_model(
        &mut self,
        commands: &mut Commands,
        model_path: &str,
        transform: Transform,
        load: impl FnOnce(&str) -> CachedModel,
    ) -> Result<Entity, ModelSourceError> {
        let model = self.model(model_path, load)?;
        Ok(commands.spawn((SceneRoot(model.scene), transform)).id())
    }

    pub fn has_failed(&self, model_path: &str, asset_server: &AssetServer) -> bool {
        self.models.get(model_path).is_some_and(|model| {
            matches!(
                asset_server.get_load_state(model.gltf.id()),
                Some(LoadState::Failed(_))
            )
        })
    }

    pub fn contains(&self, model_path: &str) -> bool {
        self.models.contains_key(model_path)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }
}
