use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use constants::map::MAP_SCHEMA_VERSION;

macro_rules! map_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

map_id!(NodeId);
map_id!(EdgeId);
map_id!(BuildingId);

/// 2D map-local point. World placement is `(x, height, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl MapNode {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn world_position(&self, height: f32) -> Vec3 {
        Vec3::new(self.x, height, self.y)
    }
}

/// Undirected connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEdge {
    pub id: EdgeId,
    pub a_node_id: NodeId,
    pub b_node_id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBuilding {
    pub id: BuildingId,
    pub name: String,
    pub model_path: String,
    pub node_id: NodeId,
}

/// Versioned map payload served by `GET /map`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default = "default_schema_version")]
    pub version: u32,
    pub nodes: Vec<MapNode>,
    pub edges: Vec<MapEdge>,
    pub buildings: Vec<MapBuilding>,
}

fn default_schema_version() -> u32 {
    MAP_SCHEMA_VERSION
}

#[derive(Debug, Error)]
pub enum MapDataError {
    #[error("map payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map payload is null or not an object")]
    NotAnObject,
    #[error("map data missing {0} array")]
    MissingArray(&'static str),
    #[error("unsupported map schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },
}

impl MapData {
    /// Parses and structurally validates a `/map` response body.
    pub fn from_json(body: &str) -> Result<Self, MapDataError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, MapDataError> {
        let object = value.as_object().ok_or(MapDataError::NotAnObject)?;

        for key in ["buildings", "nodes", "edges"] {
            if !object.get(key).is_some_and(serde_json::Value::is_array) {
                return Err(MapDataError::MissingArray(key));
            }
        }

        if let Some(version) = object.get("version").and_then(serde_json::Value::as_u64) {
            if version != u64::from(MAP_SCHEMA_VERSION) {
                return Err(MapDataError::UnsupportedVersion {
                    found: version,
                    expected: MAP_SCHEMA_VERSION,
                });
            }
        }

        Ok(serde_json::from_value(value)?)
    }
}
