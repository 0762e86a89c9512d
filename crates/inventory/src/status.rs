//! Derived item status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_catalog::{CatalogKind, CatalogLookup};

use crate::item::{Item, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    InUse,
    Maintenance,
    Damaged,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Available,
        ItemStatus::InUse,
        ItemStatus::Maintenance,
        ItemStatus::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::InUse => "in_use",
            ItemStatus::Maintenance => "maintenance",
            ItemStatus::Damaged => "damaged",
        }
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the inventory needs to know about loans.
pub trait LoanLedger {
    /// Units of `item_id` held by active or overdue loans at instant `at`.
    fn outstanding_units(&self, item_id: ItemId, at: DateTime<Utc>) -> u32;

    /// Whether any loan, in any state, references the item.
    fn has_loans(&self, item_id: ItemId) -> bool;
}

/// Compute an item's status at `now`.
///
/// Administrative overrides win over loan-derived status: a linked condition
/// flagged for maintenance means `Damaged`, a linked state flagged for
/// maintenance means `Maintenance`. Otherwise the item is `InUse` once every
/// unit on hand is committed, else `Available`.
pub fn derive_status<C, L>(item: &Item, catalog: &C, ledger: &L, now: DateTime<Utc>) -> ItemStatus
where
    C: CatalogLookup + ?Sized,
    L: LoanLedger + ?Sized,
{
    let classification = item.classification();
    let flagged = |kind: CatalogKind, id| {
        catalog
            .find(kind, id)
            .is_some_and(|entity| entity.requires_maintenance())
    };

    if classification.condition.is_some_and(|id| flagged(CatalogKind::Condition, id)) {
        return ItemStatus::Damaged;
    }
    if classification.state.is_some_and(|id| flagged(CatalogKind::State, id)) {
        return ItemStatus::Maintenance;
    }

    if ledger.outstanding_units(item.id_typed(), now) >= item.quantity_on_hand() {
        ItemStatus::InUse
    } else {
        ItemStatus::Available
    }
}

/// Read model: an item with its status computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub item: Item,
    pub status: ItemStatus,
}
