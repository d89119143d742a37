//! Map loading pipeline from backend data to a populated scene.
//!
//! ```text
//! LoadingConfig ──viewer.json──> LoadingMap ──GET /map──> Running
//!                                     │                      │
//!                                     └──invalid data──> LoadFailed
//!                    ReloadMapRequest (any state) ──> LoadingMap
//! ```

/// Building model spawning, mesh tagging and per-model failure reporting.
pub mod building_loader;

/// Map request, validation hand-off, company fetch and reload.
pub mod map_loader;

/// Model load counters forwarded to the page.
pub mod progress;
