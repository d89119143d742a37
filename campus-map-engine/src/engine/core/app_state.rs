use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    LoadingConfig,
    LoadingMap,
    Running,
    LoadFailed,
}

/// Marker for every entity that belongs to the loaded map and must go on reload.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct MapSceneEntity;

/// Request to tear down the current map and load it again, optionally from another url.
#[derive(Event, Debug, Clone, Default)]
pub struct ReloadMapRequest {
    pub url: Option<String>,
}

pub fn transition_to_running(next_state: &mut NextState<AppState>) {
    println!("→ Map data ready, transitioning to Running state");
    next_state.set(AppState::Running);
}

pub fn transition_to_load_failed(next_state: &mut NextState<AppState>) {
    println!("→ Map load failed, transitioning to LoadFailed state");
    next_state.set(AppState::LoadFailed);
}
