//! Compile-time defaults shared by the campus map engine.
//!
//! Runtime configuration (`viewer.json`) overrides a subset of these values;
//! everything else is tuned here.

/// Camera placement, projection and orbit limits.
pub mod camera;

/// Backend endpoints, totem location and map-space scales.
pub mod map;

/// Visual styling for routes, highlights, ground, labels and debug graph.
pub mod render_settings;
