use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Runtime feature toggles. Defaults match the kiosk's shipped behaviour.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub enable_camera_animation: bool,
    pub show_building_labels: bool,
    pub show_node_labels: bool,
    pub enable_building_highlight: bool,
    pub show_graph_nodes: bool,
    pub show_graph_edges: bool,
    pub enable_route_animation: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_camera_animation: true,
            show_building_labels: true,
            show_node_labels: false,
            enable_building_highlight: false,
            show_graph_nodes: false,
            show_graph_edges: false,
            enable_route_animation: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureFlag {
    EnableCameraAnimation,
    ShowBuildingLabels,
    ShowNodeLabels,
    EnableBuildingHighlight,
    ShowGraphNodes,
    ShowGraphEdges,
    EnableRouteAnimation,
}

impl FeatureFlags {
    pub fn get(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::EnableCameraAnimation => self.enable_camera_animation,
            FeatureFlag::ShowBuildingLabels => self.show_building_labels,
            FeatureFlag::ShowNodeLabels => self.show_node_labels,
            FeatureFlag::EnableBuildingHighlight => self.enable_building_highlight,
            FeatureFlag::ShowGraphNodes => self.show_graph_nodes,
            FeatureFlag::ShowGraphEdges => self.show_graph_edges,
            FeatureFlag::EnableRouteAnimation => self.enable_route_animation,
        }
    }

    /// Sets `flag`, returning whether the value changed.
    pub fn set(&mut self, flag: FeatureFlag, enabled: bool) -> bool {
        let slot = match flag {
            FeatureFlag::EnableCameraAnimation => &mut self.enable_camera_animation,
            FeatureFlag::ShowBuildingLabels => &mut self.show_building_labels,
            FeatureFlag::ShowNodeLabels => &mut self.show_node_labels,
            FeatureFlag::EnableBuildingHighlight => &mut self.enable_building_highlight,
            FeatureFlag::ShowGraphNodes => &mut self.show_graph_nodes,
            FeatureFlag::ShowGraphEdges => &mut self.show_graph_edges,
            FeatureFlag::EnableRouteAnimation => &mut self.enable_route_animation,
        };
        let changed = *slot != enabled;
        *slot = enabled;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let flags: FeatureFlags =
            serde_json::from_str(r#"{"enableBuildingHighlight": true}"#).unwrap();
        assert!(flags.enable_building_highlight);
        assert!(flags.enable_camera_animation);
        assert!(!flags.show_node_labels);
    }

    #[test]
    fn set_reports_changes() {
        let mut flags = FeatureFlags::default();
        assert!(flags.set(FeatureFlag::ShowGraphEdges, true));
        assert!(!flags.set(FeatureFlag::ShowGraphEdges, true));
        assert!(flags.get(FeatureFlag::ShowGraphEdges));

        let flag: FeatureFlag = serde_json::from_str("\"showNodeLabels\"").unwrap();
        assert_eq!(flag, FeatureFlag::ShowNodeLabels);
    }
}
