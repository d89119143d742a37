//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, state transitions,
//! and plugin initialisation for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with logging, asset sources, backend and RPC
/// plugins, and the state-driven map loading schedule.
pub mod app_setup;

/// Application state machine and loading transitions.
///
/// Moves from config loading through map loading to runtime, with a failure state.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
