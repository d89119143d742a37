//! Map data, company records and building models.
//!
//! Backend payloads are validated into typed records here; models are
//! resolved through a configurable source and cached per path.

/// Company records served by the backend and their cached directory.
pub mod company;

/// Versioned map schema: nodes, edges and buildings.
pub mod map_data;

/// Model source resolution and the per-path scene cache.
pub mod model_cache;

/// Indexed lookups over the loaded map.
pub mod registry;
