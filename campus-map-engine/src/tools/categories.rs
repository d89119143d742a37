use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Serialize;

use constants::map::ALL_CATEGORY_LABEL;

use crate::engine::assets::company::Company;
use crate::engine::assets::map_data::BuildingId;
use crate::engine::assets::registry::MapRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub building_ids: Vec<BuildingId>,
    pub company_count: usize,
}

/// Company categories mapped to the buildings that house them.
/// The first entry is the "all" category.
#[derive(Resource, Debug, Clone)]
pub struct CategoryIndex {
    categories: Vec<Category>,
}

impl Default for CategoryIndex {
    fn default() -> Self {
        Self::build(None, &[], ALL_CATEGORY_LABEL.to_string())
    }
}

impl CategoryIndex {
    pub fn build(
        registry: Option<&MapRegistry>,
        companies: &[Company],
        all_label: String,
    ) -> Self {
        let mut grouped: BTreeMap<&str, Category> = BTreeMap::new();
        let mut all_buildings: Vec<BuildingId> = registry
            .into_iter()
            .flat_map(|registry| registry.buildings())
            .map(|building| building.id)
            .collect();

        for company in companies {
            let building_id = company.building.as_ref().map(|building| building.id);
            if let Some(id) = building_id {
                all_buildings.push(id);
            }

            for name in company.category_names() {
                let category = grouped.entry(name).or_insert_with(|| Category {
                    name: name.to_string(),
                    building_ids: Vec::new(),
                    company_count: 0,
                });
                category.company_count += 1;
                if let Some(id) = building_id {
                    if !category.building_ids.contains(&id) {
                        category.building_ids.push(id);
                    }
                }
            }
        }

        all_buildings.sort_unstable();
        all_buildings.dedup();
        let all = Category {
            name: all_label,
            building_ids: all_buildings,
            company_count: companies.len(),
        };

        Self {
            categories: std::iter::once(all).chain(grouped.into_values()).collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn all_label(&self) -> &str {
        self.categories
            .first()
            .map_or(ALL_CATEGORY_LABEL, |category| category.name.as_str())
    }

    /// Buildings for a category name, matched case-insensitively.
    pub fn buildings_in(&self, name: &str) -> Option<&[BuildingId]> {
        self.categories
            .iter()
            .find(|category| category.name.eq_ignore_ascii_case(name.trim()))
            .map(|category| category.building_ids.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::registry::sample_registry;
    use crate::tools::search::fixtures::companies;

    #[test]
    fn all_category_covers_every_building() {
        let registry = sample_registry();
        let index = CategoryIndex::build(Some(&registry), &companies(), "Todas".into());

        assert_eq!(index.all_label(), "Todas");
        assert_eq!(
            index.buildings_in("todas"),
            Some([BuildingId(10), BuildingId(11)].as_slice())
        );
    }

    #[test]
    fn companies_without_building_count_but_add_nothing() {
        let index = CategoryIndex::build(None, &companies(), "Todas".into());
        let tech = index
            .categories()
            .iter()
            .find(|category| category.name == "Tecnologia")
            .unwrap();
        assert_eq!(tech.company_count, 2);
        assert_eq!(tech.building_ids, vec![BuildingId(10)]);
        assert_eq!(index.buildings_in("Alimentacao"), Some([BuildingId(11)].as_slice()));
        assert_eq!(index.buildings_in("Missing"), None);
    }

    #[test]
    fn empty_index_has_only_the_all_category() {
        let index = CategoryIndex::default();
        assert_eq!(index.categories().len(), 1);
        assert_eq!(index.all_label(), ALL_CATEGORY_LABEL);
    }
}
