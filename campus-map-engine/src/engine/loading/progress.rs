use bevy::prelude::*;

use crate::rpc::web_rpc::WebRpcInterface;

/// Building model load counters for the current map.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadingProgress {
    pub total_models: usize,
    pub loaded_models: usize,
    pub failed_models: usize,
}

impl LoadingProgress {
    pub fn is_complete(&self) -> bool {
        self.loaded_models + self.failed_models >= self.total_models
    }
}

pub fn notify_loading_progress(
    progress: Res<LoadingProgress>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !progress.is_changed() || progress.total_models == 0 {
        return;
    }
    rpc_interface.send_notification(
        "loading_progress",
        serde_json::json!({
            "total": progress.total_models,
            "loaded": progress.loaded_models,
            "failed": progress.failed_models,
            "complete": progress.is_complete(),
        }),
    );
    if progress.is_complete() {
        info!(
            "Building models settled: {} loaded, {} failed",
            progress.loaded_models, progress.failed_models
        );
    }
}
