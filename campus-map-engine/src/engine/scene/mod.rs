//! Static map scenery spawned once the map data is available.
//!
//! Everything spawned here carries `MapSceneEntity` and is despawned on reload.

/// Navigation graph overlay drawn with gizmos.
pub mod graph;

/// Grass plane and the road overlay rasterised from map edges.
pub mod ground;

/// Building and node labels rendered as projected UI text.
pub mod labels;

/// Clear colour, ambient and directional lights.
pub mod lighting;

/// "You are here" pin at the totem node.
pub mod location_marker;
