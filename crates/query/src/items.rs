use serde::{Deserialize, Serialize};

use loandesk_catalog::CatalogEntityId;
use loandesk_inventory::{ItemStatus, ItemView};

use crate::search_matches;

/// Inventory page filter. `None` (or a blank search) means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub search: String,
    pub category: Option<CatalogEntityId>,
    /// Item type ("department" on the inventory page).
    pub item_type: Option<CatalogEntityId>,
    pub status: Option<ItemStatus>,
}

impl ItemFilter {
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn category(mut self, id: CatalogEntityId) -> Self {
        self.category = Some(id);
        self
    }

    pub fn item_type(mut self, id: CatalogEntityId) -> Self {
        self.item_type = Some(id);
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, view: &ItemView) -> bool {
        let item = &view.item;
        let classification = item.classification();

        self.category.is_none_or(|id| classification.category == id)
            && self.item_type.is_none_or(|id| classification.item_type == id)
            && self.status.is_none_or(|status| view.status == status)
            && search_matches(&self.search, [item.name(), item.barcode(), item.description()])
    }
}

pub fn filter_items(views: &[ItemView], filter: &ItemFilter) -> Vec<ItemView> {
    views.iter().filter(|view| filter.matches(view)).cloned().collect()
}
