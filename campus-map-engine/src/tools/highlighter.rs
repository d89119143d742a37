use bevy::pbr::wireframe::{Wireframe, WireframeColor};
use bevy::prelude::*;
use thiserror::Error;

use constants::render_settings::OUTLINE_COLOR;

use crate::engine::assets::map_data::{BuildingId, NodeId};
use crate::engine::assets::registry::{BuildingRef, MapRegistry};
use crate::engine::loading::building_loader::{BuildingMesh, BuildingMeshIndex};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("building highlighting is disabled")]
    Disabled,
    #[error("building {0} not found")]
    UnknownBuilding(String),
}

/// Buildings currently outlined. Only the outline system touches materials.
#[derive(Resource, Debug, Default)]
pub struct HighlightState {
    buildings: Vec<BuildingId>,
    node: Option<NodeId>,
}

impl HighlightState {
    /// Outlines one building, replacing any previous highlight.
    /// An unresolvable target leaves the current highlight as it was.
    pub fn highlight_building(
        &mut self,
        target: &BuildingRef,
        registry: &MapRegistry,
        enabled: bool,
    ) -> Result<BuildingId, HighlightError> {
        if !enabled {
            return Err(HighlightError::Disabled);
        }
        let id = registry
            .resolve_building(target)
            .ok_or_else(|| HighlightError::UnknownBuilding(target.to_string()))?;

        self.buildings.clear();
        self.buildings.push(id);
        self.node = registry.node_id_for_building(id);
        Ok(id)
    }

    /// Replaces the highlighted set. Unknown targets are skipped.
    pub fn highlight_multiple(
        &mut self,
        targets: &[BuildingRef],
        registry: &MapRegistry,
        enabled: bool,
    ) -> Result<Vec<BuildingId>, HighlightError> {
        if !enabled {
            return Err(HighlightError::Disabled);
        }

        self.clear();
        for target in targets {
            match registry.resolve_building(target) {
                Some(id) if !self.buildings.contains(&id) => self.buildings.push(id),
                Some(_) => {}
                None => warn!("Highlight skipped, building {} not found", target),
            }
        }
        self.node = self
            .buildings
            .first()
            .and_then(|id| registry.node_id_for_building(*id));
        Ok(self.buildings.clone())
    }

    pub fn clear(&mut self) {
        self.buildings.clear();
        self.node = None;
    }

    /// First highlighted building.
    pub fn highlighted_building(&self) -> Option<BuildingId> {
        self.buildings.first().copied()
    }

    pub fn highlighted_buildings(&self) -> &[BuildingId] {
        &self.buildings
    }

    pub fn highlighted_node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.buildings.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

fn outline(commands: &mut Commands, mesh: Entity, enabled: bool) {
    let Ok(mut entity) = commands.get_entity(mesh) else {
        return;
    };
    if enabled {
        entity.insert((Wireframe, WireframeColor { color: OUTLINE_COLOR }));
    } else {
        entity.remove::<(Wireframe, WireframeColor)>();
    }
}

/// Keeps wireframe outlines on exactly the meshes of highlighted buildings.
/// Only the buildings entering or leaving the highlight are touched.
pub fn sync_highlight_outlines(
    mut commands: Commands,
    highlight: Res<HighlightState>,
    index: Res<BuildingMeshIndex>,
    added: Query<(Entity, &BuildingMesh), Added<BuildingMesh>>,
    mut outlined: Local<Vec<BuildingId>>,
) {
    if highlight.is_changed() {
        for building_id in outlined.iter().filter(|id| !highlight.contains(**id)) {
            for &mesh in index.meshes_of(*building_id) {
                outline(&mut commands, mesh, false);
            }
        }
        for building_id in highlight.highlighted_buildings() {
            if outlined.contains(building_id) {
                continue;
            }
            for &mesh in index.meshes_of(*building_id) {
                outline(&mut commands, mesh, true);
            }
        }
        *outlined = highlight.highlighted_buildings().to_vec();
    }

    // Meshes of a highlighted building that finish loading later.
    for (entity, mesh) in &added {
        if highlight.contains(mesh.0) {
            outline(&mut commands, entity, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::registry::sample_registry;

    #[test]
    fn highlighting_replaces_previous_building() {
        let registry = sample_registry();
        let mut state = HighlightState::default();

        assert_eq!(
            state.highlight_building(&"Predio 30".into(), &registry, true),
            Ok(BuildingId(10))
        );
        assert_eq!(state.highlighted_node(), Some(NodeId(2)));

        state
            .highlight_building(&BuildingId(11).into(), &registry, true)
            .unwrap();
        assert_eq!(state.highlighted_buildings(), &[BuildingId(11)]);
        assert_eq!(state.highlighted_node(), Some(NodeId(3)));
    }

    #[test]
    fn unknown_target_keeps_current_highlight() {
        let registry = sample_registry();
        let mut state = HighlightState::default();
        state
            .highlight_building(&"Predio 30".into(), &registry, true)
            .unwrap();

        assert_eq!(
            state.highlight_building(&"Missing".into(), &registry, true),
            Err(HighlightError::UnknownBuilding("Missing".into()))
        );
        assert_eq!(state.highlighted_building(), Some(BuildingId(10)));
    }

    #[test]
    fn disabled_highlighting_is_a_no_op() {
        let registry = sample_registry();
        let mut state = HighlightState::default();
        assert_eq!(
            state.highlight_building(&"Predio 30".into(), &registry, false),
            Err(HighlightError::Disabled)
        );
        assert!(state.is_empty());
    }

    #[test]
    fn multiple_highlight_skips_unknown_and_duplicates() {
        let registry = sample_registry();
        let mut state = HighlightState::default();
        let targets = [
            BuildingRef::from("Predio 32"),
            BuildingRef::from("Missing"),
            BuildingRef::Id(BuildingId(10)),
            BuildingRef::Id(BuildingId(11)),
        ];

        let ids = state.highlight_multiple(&targets, &registry, true).unwrap();
        assert_eq!(ids, vec![BuildingId(11), BuildingId(10)]);
        assert_eq!(state.highlighted_node(), Some(NodeId(3)));

        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.highlighted_node(), None);
    }

    #[test]
    fn outline_moves_to_newly_highlighted_building() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<HighlightState>()
            .init_resource::<BuildingMeshIndex>()
            .add_systems(Update, sync_highlight_outlines);

        let a = app.world_mut().spawn(BuildingMesh(BuildingId(10))).id();
        let b = app.world_mut().spawn(BuildingMesh(BuildingId(11))).id();
        let mut index = app.world_mut().resource_mut::<BuildingMeshIndex>();
        index.insert(a, BuildingId(10));
        index.insert(b, BuildingId(11));
        let registry = sample_registry();

        app.world_mut()
            .resource_mut::<HighlightState>()
            .highlight_building(&BuildingId(10).into(), &registry, true)
            .unwrap();
        app.update();
        assert!(app.world().entity(a).contains::<Wireframe>());
        assert!(!app.world().entity(b).contains::<Wireframe>());

        app.world_mut()
            .resource_mut::<HighlightState>()
            .highlight_building(&BuildingId(11).into(), &registry, true)
            .unwrap();
        app.update();
        assert!(!app.world().entity(a).contains::<Wireframe>());
        assert!(app.world().entity(b).contains::<Wireframe>());

        app.world_mut().resource_mut::<HighlightState>().clear();
        app.update();
        assert!(!app.world().entity(b).contains::<Wireframe>());
    }

    #[test]
    fn late_meshes_of_a_highlighted_building_are_outlined() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<HighlightState>()
            .init_resource::<BuildingMeshIndex>()
            .add_systems(Update, sync_highlight_outlines);

        app.world_mut()
            .resource_mut::<HighlightState>()
            .highlight_building(&BuildingId(10).into(), &sample_registry(), true)
            .unwrap();
        app.update();

        let late = app.world_mut().spawn(BuildingMesh(BuildingId(10))).id();
        let other = app.world_mut().spawn(BuildingMesh(BuildingId(11))).id();
        app.update();

        assert!(app.world().entity(late).contains::<Wireframe>());
        assert!(!app.world().entity(other).contains::<Wireframe>());
    }
}
