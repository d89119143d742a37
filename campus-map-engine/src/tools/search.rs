use bevy::prelude::*;
use serde::Serialize;

use crate::engine::assets::company::{Company, CompanyDirectory};
use crate::engine::assets::map_data::{BuildingId, NodeId};
use crate::engine::assets::registry::MapRegistry;
use crate::engine::config::ViewerConfig;

use super::categories::CategoryIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Building,
    Company,
}

/// Searchable place a route can lead to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub kind: DestinationKind,
    pub name: String,
    pub building_id: Option<BuildingId>,
    pub building_name: Option<String>,
    pub node_id: Option<NodeId>,
    pub company_id: Option<u32>,
    pub floor: Option<String>,
}

impl Destination {
    fn from_company(company: &Company) -> Self {
        Self {
            kind: DestinationKind::Company,
            name: company.name.clone(),
            building_id: company.building.as_ref().map(|building| building.id),
            building_name: company.building.as_ref().map(|building| building.name.clone()),
            node_id: company.node_id(),
            company_id: Some(company.id),
            floor: company.floor.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct SearchEntry {
    destination: Destination,
    name_key: String,
    building_key: Option<String>,
}

impl SearchEntry {
    fn new(destination: Destination) -> Self {
        Self {
            name_key: destination.name.to_lowercase(),
            building_key: destination.building_name.as_deref().map(str::to_lowercase),
            destination,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.name_key.contains(query)
            || self
                .building_key
                .as_deref()
                .is_some_and(|building| building.contains(query))
    }
}

/// Buildings and companies, matched by case-insensitive substring.
#[derive(Resource, Debug, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn build(registry: Option<&MapRegistry>, companies: &[Company]) -> Self {
        let buildings = registry
            .into_iter()
            .flat_map(|registry| registry.buildings())
            .map(|building| Destination {
                kind: DestinationKind::Building,
                name: building.name.clone(),
                building_id: Some(building.id),
                building_name: Some(building.name.clone()),
                node_id: Some(building.node_id),
                company_id: None,
                floor: None,
            });

        let entries = buildings
            .chain(companies.iter().map(Destination::from_company))
            .map(SearchEntry::new)
            .collect();
        Self { entries }
    }

    /// First `limit` matches in index order. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Destination> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.matches(&query))
            .map(|entry| &entry.destination)
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuilds search and category indexes when the map or the company list changes.
pub fn rebuild_destination_indexes(
    registry: Option<Res<MapRegistry>>,
    directory: Res<CompanyDirectory>,
    config: Res<ViewerConfig>,
    mut had_registry: Local<bool>,
    mut search: ResMut<SearchIndex>,
    mut categories: ResMut<CategoryIndex>,
) {
    let registry_changed = registry.as_ref().is_some_and(|registry| registry.is_changed())
        || registry.is_some() != *had_registry;
    if !(registry_changed || directory.is_changed() || config.is_changed()) {
        return;
    }
    *had_registry = registry.is_some();

    let registry = registry.as_deref();
    *search = SearchIndex::build(registry, directory.companies());
    *categories = CategoryIndex::build(
        registry,
        directory.companies(),
        config.all_category_label.clone(),
    );
    debug!(
        "Destination indexes rebuilt: {} entries, {} categories",
        search.len(),
        categories.categories().len()
    );
}
