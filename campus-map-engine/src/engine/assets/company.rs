use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::map_data::{BuildingId, NodeId};

/// Company record served by `GET /companies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CompanyCategory>,
    #[serde(default)]
    pub building: Option<CompanyBuilding>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBuilding {
    pub id: BuildingId,
    pub name: String,
    pub node: CompanyNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyNode {
    pub id: NodeId,
}

impl Company {
    pub fn node_id(&self) -> Option<NodeId> {
        self.building.as_ref().map(|building| building.node.id)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.name.as_str())
    }
}

/// Cached company list. Refetched only when empty or when forced.
#[derive(Resource, Debug, Default)]
pub struct CompanyDirectory {
    companies: Vec<Company>,
    loaded: bool,
    in_flight: bool,
    last_error: Option<String>,
    fetched_at_secs: Option<f64>,
}

impl CompanyDirectory {
    /// Returns true when the caller should issue a `/companies` request.
    pub fn begin_fetch(&mut self, force: bool) -> bool {
        if self.in_flight || (self.loaded && !force) {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn store(&mut self, companies: Vec<Company>, now_secs: f64) {
        info!("Company directory updated with {} entries", companies.len());
        self.companies = companies;
        self.loaded = true;
        self.in_flight = false;
        self.last_error = None;
        self.fetched_at_secs = Some(now_secs);
    }

    pub fn fail(&mut self, error: String) {
        self.in_flight = false;
        self.last_error = Some(error);
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn fetched_at_secs(&self) -> Option<f64> {
        self.fetched_at_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_company_with_and_without_building() {
        let body = r#"[
            {"id": 1, "name": "Acme", "categories": [{"name": "Software"}],
             "building": {"id": 3, "name": "Predio 32", "node": {"id": 12}}, "floor": "2"},
            {"id": 2, "name": "BeasyBox", "categories": [], "building": null}
        ]"#;
        let companies: Vec<Company> = serde_json::from_str(body).unwrap();
        assert_eq!(companies[0].node_id(), Some(NodeId(12)));
        assert_eq!(companies[0].category_names().collect::<Vec<_>>(), ["Software"]);
        assert_eq!(companies[1].node_id(), None);
        assert_eq!(companies[1].floor, None);
    }

    #[test]
    fn cached_directory_skips_refetch_unless_forced() {
        let mut directory = CompanyDirectory::default();
        assert!(directory.begin_fetch(false));
        assert!(!directory.begin_fetch(true), "request already in flight");

        directory.store(Vec::new(), 1.0);
        assert!(!directory.begin_fetch(false));
        assert!(directory.begin_fetch(true));

        directory.fail("offline".into());
        assert_eq!(directory.last_error(), Some("offline"));
        assert!(directory.is_loaded());
    }
}
