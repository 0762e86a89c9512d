use serde::{Deserialize, Serialize};

use loandesk_catalog::{CatalogEntity, CatalogEntityId};

use crate::search_matches;

/// Catalog list page filter: search over name and code, optional parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    #[serde(default)]
    pub search: String,
    pub parent: Option<CatalogEntityId>,
}

impl CatalogFilter {
    pub fn matches(&self, entity: &CatalogEntity) -> bool {
        self.parent.is_none_or(|parent| entity.parent_id() == Some(parent))
            && search_matches(&self.search, [entity.name(), entity.code().unwrap_or_default()])
    }
}

pub fn filter_catalog(entities: &[CatalogEntity], filter: &CatalogFilter) -> Vec<CatalogEntity> {
    entities
        .iter()
        .filter(|entity| filter.matches(entity))
        .cloned()
        .collect()
}
