//! Runtime diagnostics.
//!
//! Frame rate reporting to the host page over RPC, plus an on-screen
//! readout in native builds.

/// FPS tracking and notification systems.
///
/// Sends frame rate updates to the page and updates the native overlay.
pub mod fps_tracking;
