//! Dashboard figures.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use loandesk_catalog::{CatalogEntityId, CatalogKind, CatalogLookup};
use loandesk_inventory::{ItemStatus, ItemView};
use loandesk_loans::{LoanStatus, LoanView};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub available: usize,
    pub in_use: usize,
    pub maintenance: usize,
    pub damaged: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Available => self.available += 1,
            ItemStatus::InUse => self.in_use += 1,
            ItemStatus::Maintenance => self.maintenance += 1,
            ItemStatus::Damaged => self.damaged += 1,
        }
    }

    pub fn get(&self, status: ItemStatus) -> usize {
        match status {
            ItemStatus::Available => self.available,
            ItemStatus::InUse => self.in_use,
            ItemStatus::Maintenance => self.maintenance,
            ItemStatus::Damaged => self.damaged,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Item records.
    pub total_items: usize,
    /// Physical units across all item records.
    pub total_units: u64,
    pub by_status: StatusCounts,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub returned_loans: usize,
    /// Units per category name.
    pub units_by_category: BTreeMap<String, u64>,
    /// Loans (any status) per item type name.
    pub loans_by_item_type: BTreeMap<String, usize>,
}

/// Aggregate item and loan views taken at the same `now`.
///
/// Catalog names are resolved through `catalog`; an id the catalog no longer
/// knows is reported under its raw id. Loans on items absent from `items`
/// count toward the loan totals only.
pub fn summarize<C>(items: &[ItemView], loans: &[LoanView], catalog: &C) -> InventorySummary
where
    C: CatalogLookup + ?Sized,
{
    let mut summary = InventorySummary::default();
    let name_of = |kind: CatalogKind, id: CatalogEntityId| {
        catalog
            .find(kind, id)
            .map(|entity| entity.name().to_string())
            .unwrap_or_else(|| id.to_string())
    };

    let mut item_types = HashMap::with_capacity(items.len());
    for view in items {
        let item = &view.item;
        let classification = item.classification();
        let units = u64::from(item.quantity_on_hand());

        summary.total_items += 1;
        summary.total_units += units;
        summary.by_status.bump(view.status);
        *summary
            .units_by_category
            .entry(name_of(CatalogKind::Category, classification.category))
            .or_default() += units;
        item_types.insert(item.id_typed(), classification.item_type);
    }

    for view in loans {
        match view.status {
            LoanStatus::Active => summary.active_loans += 1,
            LoanStatus::Overdue => summary.overdue_loans += 1,
            LoanStatus::Returned => summary.returned_loans += 1,
        }
        if let Some(&item_type) = item_types.get(&view.loan.item_id()) {
            *summary
                .loans_by_item_type
                .entry(name_of(CatalogKind::ItemType, item_type))
                .or_default() += 1;
        }
    }

    summary
}
