//! Item registry: validated creation/edits and status reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_catalog::{CatalogEntityId, CatalogKind, CatalogLookup, ReferenceIndex};
use loandesk_core::{Aggregate, DomainError, DomainResult, InMemoryRepository, Repository};

use crate::item::{
    DeactivateItem, Item, ItemClassification, ItemCommand, ItemEvent, ItemId, ItemPatch, NewItem,
    PurgeItem, ReactivateItem, RegisterItem, ReviseItem,
};
use crate::status::{ItemStatus, ItemView, LoanLedger, derive_status};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListOptions {
    pub include_inactive: bool,
}

/// Registry of loanable items plus an append-only journal of item events.
#[derive(Debug, Clone)]
pub struct ItemRegistry<R = InMemoryRepository<ItemId, Item>> {
    repo: R,
    journal: Vec<ItemEvent>,
}

impl ItemRegistry {
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<R> ItemRegistry<R>
where
    R: Repository<ItemId, Item>,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            journal: Vec::new(),
        }
    }

    pub fn create<C>(&mut self, new_item: NewItem, catalog: &C, now: DateTime<Utc>) -> DomainResult<Item>
    where
        C: CatalogLookup + ?Sized,
    {
        let details = new_item.details()?;
        let barcode = new_item.barcode.trim();
        if let Some(existing) = self.find_by_barcode(barcode) {
            return Err(DomainError::validation(format!(
                "barcode '{}' is already assigned to item {}",
                existing.barcode(),
                existing.id_typed()
            )));
        }
        resolve_references(&new_item.classification, None, catalog)?;

        let item_id = ItemId::generate();
        let command = ItemCommand::RegisterItem(RegisterItem {
            item_id,
            barcode: barcode.to_string(),
            details,
            classification: new_item.classification,
            occurred_at: now,
        });
        self.execute(Item::empty(item_id), &command)
    }

    pub fn update<C>(&mut self, id: ItemId, patch: ItemPatch, catalog: &C, now: DateTime<Utc>) -> DomainResult<Item>
    where
        C: CatalogLookup + ?Sized,
    {
        let item = self.get(id)?;
        let (details, classification) = patch.applied_to(item.details(), item.classification())?;
        resolve_references(&classification, Some(item.classification()), catalog)?;

        let command = ItemCommand::ReviseItem(ReviseItem {
            item_id: id,
            details,
            classification,
            occurred_at: now,
        });
        self.execute(item, &command)
    }

    /// Soft-deactivate. Deactivated items accept no new loans.
    pub fn deactivate(&mut self, id: ItemId, now: DateTime<Utc>) -> DomainResult<Item> {
        let item = self.get(id)?;
        let command = ItemCommand::DeactivateItem(DeactivateItem {
            item_id: id,
            occurred_at: now,
        });
        self.execute(item, &command)
    }

    pub fn reactivate(&mut self, id: ItemId, now: DateTime<Utc>) -> DomainResult<Item> {
        let item = self.get(id)?;
        let command = ItemCommand::ReactivateItem(ReactivateItem {
            item_id: id,
            occurred_at: now,
        });
        self.execute(item, &command)
    }

    /// Hard-delete an item that no loan has ever referenced. The journal
    /// keeps an `ItemPurged` entry.
    pub fn purge<L>(&mut self, id: ItemId, ledger: &L, now: DateTime<Utc>) -> DomainResult<Item>
    where
        L: LoanLedger + ?Sized,
    {
        let mut item = self.get(id)?;
        if ledger.has_loans(id) {
            return Err(DomainError::invalid_state(format!(
                "item {} is referenced by loans; deactivate it instead",
                item.barcode()
            )));
        }
        let events = item.execute(&ItemCommand::PurgeItem(PurgeItem {
            item_id: id,
            occurred_at: now,
        }))?;
        self.repo.remove(&id);
        self.journal.extend(events);
        Ok(item)
    }

    pub fn get(&self, id: ItemId) -> DomainResult<Item> {
        self.repo
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    /// Scanner lookup (case-insensitive, surrounding whitespace ignored).
    pub fn find_by_barcode(&self, barcode: &str) -> Option<Item> {
        let wanted = barcode.trim().to_uppercase();
        self.repo
            .list()
            .into_iter()
            .find(|item| item.barcode().to_uppercase() == wanted)
    }

    pub fn list(&self, options: ItemListOptions) -> Vec<Item> {
        self.repo
            .list()
            .into_iter()
            .filter(|item| options.include_inactive || item.active())
            .collect()
    }

    pub fn get_status<C, L>(&self, id: ItemId, catalog: &C, ledger: &L, now: DateTime<Utc>) -> DomainResult<ItemStatus>
    where
        C: CatalogLookup + ?Sized,
        L: LoanLedger + ?Sized,
    {
        let item = self.get(id)?;
        Ok(derive_status(&item, catalog, ledger, now))
    }

    /// Active items with their status at `now`, kept when `filter` accepts them.
    pub fn list_with_status<C, L, F>(&self, catalog: &C, ledger: &L, now: DateTime<Utc>, filter: F) -> Vec<ItemView>
    where
        C: CatalogLookup + ?Sized,
        L: LoanLedger + ?Sized,
        F: Fn(&ItemView) -> bool,
    {
        self.list(ItemListOptions::default())
            .into_iter()
            .map(|item| {
                let status = derive_status(&item, catalog, ledger, now);
                ItemView { item, status }
            })
            .filter(|view| filter(view))
            .collect()
    }

    /// Every item event committed so far, oldest first.
    pub fn journal(&self) -> &[ItemEvent] {
        &self.journal
    }

    fn execute(&mut self, mut item: Item, command: &ItemCommand) -> DomainResult<Item> {
        let events = item.execute(command)?;
        self.repo.upsert(item.id_typed(), item.clone());
        self.journal.extend(events);
        Ok(item)
    }
}

/// Every reference must resolve to an active entity of the right kind at the
/// time it is set. References carried over unchanged from `previous` are not
/// re-checked: the catalog may have deactivated them since.
fn resolve_references<C>(
    classification: &ItemClassification,
    previous: Option<&ItemClassification>,
    catalog: &C,
) -> DomainResult<()>
where
    C: CatalogLookup + ?Sized,
{
    let unchanged = previous.map(ItemClassification::references).unwrap_or_default();
    for (kind, id) in classification.references() {
        if unchanged.contains(&(kind, id)) {
            continue;
        }
        catalog.resolve_active(kind, id)?;
    }
    Ok(())
}

impl<R> ReferenceIndex for ItemRegistry<R>
where
    R: Repository<ItemId, Item>,
{
    fn is_referenced(&self, kind: CatalogKind, id: CatalogEntityId) -> bool {
        self.repo
            .list()
            .iter()
            .any(|item| item.active() && item.classification().references_entity(kind, id))
    }
}
