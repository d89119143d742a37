use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::map_data::{BuildingId, MapBuilding, MapData, MapEdge, MapNode, NodeId};

/// A building addressed either by id or by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildingRef {
    Id(BuildingId),
    Name(String),
}

impl From<BuildingId> for BuildingRef {
    fn from(id: BuildingId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for BuildingRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl std::fmt::Display for BuildingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Lookup tables over the loaded map. Inserted when `/map` validates and
/// removed on reload.
#[derive(Resource, Debug, Clone, Default)]
pub struct MapRegistry {
    data: MapData,
    nodes: HashMap<NodeId, usize>,
    buildings: HashMap<BuildingId, usize>,
    building_names: HashMap<String, BuildingId>,
}

impl MapRegistry {
    pub fn new(data: MapData) -> Self {
        let nodes = data
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect::<HashMap<_, _>>();
        let buildings = data
            .buildings
            .iter()
            .enumerate()
            .map(|(index, building)| (building.id, index))
            .collect();
        let building_names = data
            .buildings
            .iter()
            .map(|building| (building.name.clone(), building.id))
            .collect();

        for edge in &data.edges {
            if !nodes.contains_key(&edge.a_node_id) || !nodes.contains_key(&edge.b_node_id) {
                warn!(
                    "Edge {} references missing node ({} - {}), it will not be drawn",
                    edge.id, edge.a_node_id, edge.b_node_id
                );
            }
        }

        Self {
            data,
            nodes,
            buildings,
            building_names,
        }
    }

    pub fn data(&self) -> &MapData {
        &self.data
    }

    pub fn node(&self, id: NodeId) -> Option<&MapNode> {
        self.nodes.get(&id).map(|&index| &self.data.nodes[index])
    }

    pub fn node_position(&self, id: NodeId) -> Option<Vec2> {
        self.node(id).map(MapNode::position)
    }

    pub fn building(&self, id: BuildingId) -> Option<&MapBuilding> {
        self.buildings
            .get(&id)
            .map(|&index| &self.data.buildings[index])
    }

    pub fn building_by_name(&self, name: &str) -> Option<&MapBuilding> {
        self.building_id_by_name(name)
            .and_then(|id| self.building(id))
    }

    pub fn building_id_by_name(&self, name: &str) -> Option<BuildingId> {
        self.building_names.get(name).copied()
    }

    pub fn node_id_for_building(&self, id: BuildingId) -> Option<NodeId> {
        self.building(id).map(|building| building.node_id)
    }

    pub fn resolve_building(&self, reference: &BuildingRef) -> Option<BuildingId> {
        match reference {
            BuildingRef::Id(id) => self.buildings.contains_key(id).then_some(*id),
            BuildingRef::Name(name) => self.building_id_by_name(name),
        }
    }

    pub fn nodes(&self) -> &[MapNode] {
        &self.data.nodes
    }

    pub fn edges(&self) -> &[MapEdge] {
        &self.data.edges
    }

    pub fn buildings(&self) -> &[MapBuilding] {
        &self.data.buildings
    }

    /// Edge endpoints in map space, skipping edges with dangling node references.
    pub fn edge_segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.data.edges.iter().filter_map(|edge| {
            Some((
                self.node_position(edge.a_node_id)?,
                self.node_position(edge.b_node_id)?,
            ))
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_registry() -> MapRegistry {
    use super::map_data::{EdgeId, MapEdge};

    let node = |id, x, y| MapNode {
        id: NodeId(id),
        x,
        y,
    };
    MapRegistry::new(MapData {
        version: 1,
        nodes: vec![node(1, 0.0, 0.0), node(2, 10.0, 0.0), node(3, 10.0, 10.0)],
        edges: vec![
            MapEdge {
                id: EdgeId(1),
                a_node_id: NodeId(1),
                b_node_id: NodeId(2),
            },
            MapEdge {
                id: EdgeId(2),
                a_node_id: NodeId(2),
                b_node_id: NodeId(99),
            },
        ],
        buildings: vec![
            MapBuilding {
                id: BuildingId(10),
                name: "Predio 30".into(),
                model_path: "/models/30.glb".into(),
                node_id: NodeId(2),
            },
            MapBuilding {
                id: BuildingId(11),
                name: "Predio 32".into(),
                model_path: "/models/32.glb".into(),
                node_id: NodeId(3),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ids_and_names() {
        let registry = sample_registry();
        assert_eq!(
            registry.resolve_building(&BuildingRef::from("Predio 32")),
            Some(BuildingId(11))
        );
        assert_eq!(
            registry.resolve_building(&BuildingRef::Id(BuildingId(10))),
            Some(BuildingId(10))
        );
        assert_eq!(registry.resolve_building(&BuildingRef::from("Nope")), None);
        assert_eq!(registry.resolve_building(&BuildingRef::Id(BuildingId(5))), None);
        assert_eq!(registry.node_id_for_building(BuildingId(11)), Some(NodeId(3)));
    }

    #[test]
    fn dangling_edges_are_skipped() {
        let registry = sample_registry();
        let segments: Vec<_> = registry.edge_segments().collect();
        assert_eq!(segments, vec![(Vec2::ZERO, Vec2::new(10.0, 0.0))]);
    }

    #[test]
    fn building_ref_accepts_numbers_and_strings() {
        let refs: Vec<BuildingRef> = serde_json::from_str(r#"[10, "Predio 32"]"#).unwrap();
        assert_eq!(
            refs,
            vec![BuildingRef::Id(BuildingId(10)), BuildingRef::from("Predio 32")]
        );
    }
}
