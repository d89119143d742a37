use std::collections::{BTreeMap, HashMap};

use bevy::asset::LoadState;
use bevy::prelude::*;

use constants::map::BUILDING_BASE_HEIGHT;

use crate::engine::assets::map_data::BuildingId;
use crate::engine::assets::model_cache::{CachedModel, ModelCache, load_gltf};
use crate::engine::assets::registry::MapRegistry;
use crate::engine::core::app_state::MapSceneEntity;

use super::progress::LoadingProgress;

/// Root of a spawned building model.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct BuildingModel {
    pub building_id: BuildingId,
    pub model_path: String,
}

/// Mesh entity inside a building model.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingMesh(pub BuildingId);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLoadOutcome {
    Loaded,
    Failed,
}

/// Building id → model root for every model that was spawned and has not failed.
#[derive(Resource, Debug, Default)]
pub struct SpawnedBuildings {
    roots: BTreeMap<BuildingId, (Entity, String)>,
}

impl SpawnedBuildings {
    pub fn insert(&mut self, building_id: BuildingId, root: Entity, name: String) {
        self.roots.insert(building_id, (root, name));
    }

    pub fn remove(&mut self, building_id: BuildingId) {
        self.roots.remove(&building_id);
    }

    pub fn root(&self, building_id: BuildingId) -> Option<Entity> {
        self.roots.get(&building_id).map(|(root, _)| *root)
    }

    pub fn names(&self) -> Vec<String> {
        self.roots.values().map(|(_, name)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }
}

/// Two-way mesh entity ↔ building lookup used by picking and highlighting.
#[derive(Resource, Debug, Default)]
pub struct BuildingMeshIndex {
    by_mesh: HashMap<Entity, BuildingId>,
    by_building: HashMap<BuildingId, Vec<Entity>>,
}

impl BuildingMeshIndex {
    pub fn insert(&mut self, mesh: Entity, building_id: BuildingId) {
        if self.by_mesh.insert(mesh, building_id).is_none() {
            self.by_building.entry(building_id).or_default().push(mesh);
        }
    }

    pub fn building_for(&self, mesh: Entity) -> Option<BuildingId> {
        self.by_mesh.get(&mesh).copied()
    }

    pub fn meshes_of(&self, building_id: BuildingId) -> &[Entity] {
        self.by_building
            .get(&building_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mesh.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_mesh.clear();
        self.by_building.clear();
    }
}

/// Places every building's model on its anchor node. Buildings whose node or
/// model path cannot be resolved are logged and skipped.
pub fn spawn_buildings(
    mut commands: Commands,
    registry: Res<MapRegistry>,
    asset_server: Res<AssetServer>,
    mut cache: ResMut<ModelCache>,
    mut spawned: ResMut<SpawnedBuildings>,
    mut progress: ResMut<LoadingProgress>,
) {
    place_buildings(
        &mut commands,
        &registry,
        &mut cache,
        &mut spawned,
        &mut progress,
        |resolved| load_gltf(&asset_server, resolved),
    );
}

pub fn place_buildings(
    commands: &mut Commands,
    registry: &MapRegistry,
    cache: &mut ModelCache,
    spawned: &mut SpawnedBuildings,
    progress: &mut LoadingProgress,
    mut load: impl FnMut(&str) -> CachedModel,
) {
    *progress = LoadingProgress::default();

    for building in registry.buildings() {
        let Some(node) = registry.node(building.node_id) else {
            warn!(
                "Building {} '{}' anchored on missing node {}, skipped",
                building.id, building.name, building.node_id
            );
            continue;
        };

        let transform = Transform::from_translation(node.world_position(BUILDING_BASE_HEIGHT));
        match cache.spawn_model(commands, &building.model_path, transform, &mut load) {
            Ok(root) => {
                commands.entity(root).insert((
                    Name::new(building.name.clone()),
                    BuildingModel {
                        building_id: building.id,
                        model_path: building.model_path.clone(),
                    },
                    MapSceneEntity,
                ));
                spawned.insert(building.id, root, building.name.clone());
                progress.total_models += 1;
            }
            Err(error) => {
                error!(
                    "Building {} '{}' skipped: {}",
                    building.id, building.name, error
                );
            }
        }
    }

    info!(
        "Spawned {} building models ({} distinct files)",
        spawned.len(),
        cache.len()
    );
}

/// Marks model roots as loaded or failed once the asset server settles them.
pub fn track_model_loads(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    cache: Res<ModelCache>,
    models: Query<(Entity, &BuildingModel, &SceneRoot), Without<ModelLoadOutcome>>,
    mut spawned: ResMut<SpawnedBuildings>,
    mut progress: ResMut<LoadingProgress>,
) {
    for (entity, model, scene) in &models {
        let outcome = if cache.has_failed(&model.model_path, &asset_server) {
            ModelLoadOutcome::Failed
        } else if matches!(
            asset_server.get_load_state(scene.0.id()),
            Some(LoadState::Loaded)
        ) {
            ModelLoadOutcome::Loaded
        } else {
            continue;
        };
        record_model_outcome(
            &mut commands,
            entity,
            model,
            outcome,
            &mut spawned,
            &mut progress,
        );
    }
}

/// A failed model drops its building from the spawned set; the rest of the map stays.
pub fn record_model_outcome(
    commands: &mut Commands,
    root: Entity,
    model: &BuildingModel,
    outcome: ModelLoadOutcome,
    spawned: &mut SpawnedBuildings,
    progress: &mut LoadingProgress,
) {
    match outcome {
        ModelLoadOutcome::Failed => {
            error!(
                "Model {} for building {} failed to load, building skipped",
                model.model_path, model.building_id
            );
            spawned.remove(model.building_id);
            progress.failed_models += 1;
        }
        ModelLoadOutcome::Loaded => progress.loaded_models += 1,
    }
    commands.entity(root).insert(outcome);
}

fn owning_building(
    entity: Entity,
    parents: &Query<&ChildOf>,
    models: &Query<&BuildingModel>,
) -> Option<BuildingId> {
    let mut current = entity;
    while let Ok(child_of) = parents.get(current) {
        current = child_of.parent();
        if let Ok(model) = models.get(current) {
            return Some(model.building_id);
        }
    }
    None
}

/// Tags freshly spawned scene meshes with their building, indexes them and
/// makes their materials non-metallic.
pub fn tag_building_meshes(
    mut commands: Commands,
    new_meshes: Query<(Entity, Option<&MeshMaterial3d<StandardMaterial>>), Added<Mesh3d>>,
    parents: Query<&ChildOf>,
    models: Query<&BuildingModel>,
    mut index: ResMut<BuildingMeshIndex>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (entity, material) in &new_meshes {
        let Some(building_id) = owning_building(entity, &parents, &models) else {
            continue;
        };

        commands.entity(entity).insert(BuildingMesh(building_id));
        index.insert(entity, building_id);

        if let Some(material) = material.and_then(|material| materials.get_mut(&material.0)) {
            material.metallic = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn mesh_index_is_two_way_and_deduplicated() {
        let mut index = BuildingMeshIndex::default();
        let mesh = Entity::from_raw(7);
        index.insert(mesh, BuildingId(3));
        index.insert(mesh, BuildingId(3));

        assert_eq!(index.building_for(mesh), Some(BuildingId(3)));
        assert_eq!(index.meshes_of(BuildingId(3)), &[mesh]);
        assert!(index.meshes_of(BuildingId(4)).is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn nested_meshes_are_tagged_with_their_building() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<BuildingMeshIndex>()
            .add_systems(Update, tag_building_meshes);

        let material = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                metallic: 0.8,
                ..default()
            });
        let root = app
            .world_mut()
            .spawn(BuildingModel {
                building_id: BuildingId(11),
                model_path: "models/32.glb".into(),
            })
            .id();
        let node = app.world_mut().spawn(ChildOf(root)).id();
        let mesh = app
            .world_mut()
            .spawn((
                Mesh3d(Handle::default()),
                MeshMaterial3d(material.clone()),
                ChildOf(node),
            ))
            .id();
        let stray = app.world_mut().spawn(Mesh3d(Handle::default())).id();

        app.update();

        assert_eq!(
            app.world().get::<BuildingMesh>(mesh),
            Some(&BuildingMesh(BuildingId(11)))
        );
        assert!(app.world().get::<BuildingMesh>(stray).is_none());
        assert_eq!(
            app.world().resource::<BuildingMeshIndex>().building_for(mesh),
            Some(BuildingId(11))
        );
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        assert_eq!(materials.get(&material).unwrap().metallic, 0.0);
    }

    #[test]
    fn spawned_buildings_report_names_in_id_order() {
        let mut spawned = SpawnedBuildings::default();
        spawned.insert(BuildingId(11), Entity::from_raw(2), "Predio 32".into());
        spawned.insert(BuildingId(10), Entity::from_raw(1), "Predio 30".into());
        assert_eq!(spawned.names(), vec!["Predio 30", "Predio 32"]);

        spawned.remove(BuildingId(10));
        assert_eq!(spawned.root(BuildingId(10)), None);
        assert_eq!(spawned.len(), 1);
    }

    fn loader_registry() -> MapRegistry {
        use crate::engine::assets::map_data::{MapBuilding, MapData, MapNode, NodeId};

        let building = |id, name: &str, model_path: &str, node| MapBuilding {
            id: BuildingId(id),
            name: name.into(),
            model_path: model_path.into(),
            node_id: NodeId(node),
        };
        MapRegistry::new(MapData {
            version: 1,
            nodes: vec![
                MapNode {
                    id: NodeId(1),
                    x: 0.0,
                    y: 0.0,
                },
                MapNode {
                    id: NodeId(2),
                    x: 10.0,
                    y: 5.0,
                },
            ],
            edges: Vec::new(),
            buildings: vec![
                building(10, "Predio 30", "/models/30.glb", 1),
                building(11, "Predio 32", "/models/32.glb", 2),
                building(12, "Predio 40", "/models/40.glb", 99),
                building(13, "Predio 41", "  ", 1),
                building(14, "Predio 50", "/models/30.glb", 2),
            ],
        })
    }

    fn placed_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(loader_registry())
            .init_resource::<ModelCache>()
            .init_resource::<SpawnedBuildings>()
            .init_resource::<LoadingProgress>();
        app.world_mut()
            .run_system_once(
                |mut commands: Commands,
                 registry: Res<MapRegistry>,
                 mut cache: ResMut<ModelCache>,
                 mut spawned: ResMut<SpawnedBuildings>,
                 mut progress: ResMut<LoadingProgress>| {
                    place_buildings(
                        &mut commands,
                        &registry,
                        &mut cache,
                        &mut spawned,
                        &mut progress,
                        |_| CachedModel {
                            gltf: Handle::default(),
                            scene: Handle::default(),
                        },
                    );
                },
            )
            .unwrap();
        app
    }

    #[test]
    fn unplaceable_buildings_are_skipped_and_the_rest_load() {
        let mut app = placed_app();

        let spawned = app.world().resource::<SpawnedBuildings>();
        assert_eq!(spawned.names(), vec!["Predio 30", "Predio 32", "Predio 50"]);
        assert_eq!(spawned.root(BuildingId(12)), None);
        assert_eq!(spawned.root(BuildingId(13)), None);
        assert_eq!(app.world().resource::<LoadingProgress>().total_models, 3);
        assert_eq!(app.world().resource::<ModelCache>().len(), 2);

        let root = spawned.root(BuildingId(11)).unwrap();
        let transform = app.world().get::<Transform>(root).unwrap();
        assert_eq!(transform.translation.x, 10.0);
        assert_eq!(transform.translation.z, 5.0);

        let mut models = app.world_mut().query::<&BuildingModel>();
        assert_eq!(models.iter(app.world()).count(), 3);
    }

    #[test]
    fn failed_model_drops_only_its_building() {
        let mut app = placed_app();
        let root = app
            .world()
            .resource::<SpawnedBuildings>()
            .root(BuildingId(10))
            .unwrap();
        let other = app
            .world()
            .resource::<SpawnedBuildings>()
            .root(BuildingId(11))
            .unwrap();

        app.world_mut()
            .run_system_once(
                move |mut commands: Commands,
                      models: Query<&BuildingModel>,
                      mut spawned: ResMut<SpawnedBuildings>,
                      mut progress: ResMut<LoadingProgress>| {
                    for (entity, outcome) in [
                        (root, ModelLoadOutcome::Failed),
                        (other, ModelLoadOutcome::Loaded),
                    ] {
                        let model = models.get(entity).unwrap();
                        record_model_outcome(
                            &mut commands,
                            entity,
                            model,
                            outcome,
                            &mut spawned,
                            &mut progress,
                        );
                    }
                },
            )
            .unwrap();

        let spawned = app.world().resource::<SpawnedBuildings>();
        assert_eq!(spawned.root(BuildingId(10)), None);
        assert_eq!(spawned.names(), vec!["Predio 32", "Predio 50"]);
        let progress = *app.world().resource::<LoadingProgress>();
        assert_eq!(progress.failed_models, 1);
        assert_eq!(progress.loaded_models, 1);
        assert!(!progress.is_complete());
        assert_eq!(
            app.world().get::<ModelLoadOutcome>(root),
            Some(&ModelLoadOutcome::Failed)
        );
    }
}
