//! The lending desk: one entry point for every console operation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use loandesk_auth::Permission;
use loandesk_catalog::{
    Catalog, CatalogDraft, CatalogEntity, CatalogEntityId, CatalogKind, Deactivation, ListOptions,
};
use loandesk_core::{Clock, DomainResult, SystemClock};
use loandesk_events::{EventBus, InMemoryEventBus, Subscription};
use loandesk_inventory::{ItemId, ItemListOptions, ItemPatch, ItemRegistry, ItemView, NewItem, derive_status};
use loandesk_loans::{
    DenyList, DenyListEntry, DenyListEntryId, LoanBook, LoanDetails, LoanId, LoanRequest, LoanView,
    NewDenyListEntry, Requester,
};
use loandesk_query::{
    CatalogFilter, InventorySummary, ItemFilter, LoanFilter, LoanSort, Page, filter_catalog, filter_items,
    filter_loans, sort_loans, summarize,
};

use crate::config::DeskConfig;
use crate::context::RequestContext;
use crate::errors::{DeskError, DeskResult};
use crate::events::DeskEvent;

/// Loan request as submitted from the loan form. Blank dates fall back to
/// "now" and "start plus the configured loan length".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanForm {
    pub item_id: ItemId,
    pub requester: Requester,
    pub start_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: LoanDetails,
}

impl LoanForm {
    pub fn new(item_id: ItemId, requester: Requester) -> Self {
        Self {
            item_id,
            requester,
            start_at: None,
            due_at: None,
            details: LoanDetails::default(),
        }
    }

    pub fn window(mut self, start_at: DateTime<Utc>, due_at: DateTime<Utc>) -> Self {
        self.start_at = Some(start_at);
        self.due_at = Some(due_at);
        self
    }

    pub fn details(mut self, details: LoanDetails) -> Self {
        self.details = details;
        self
    }
}

/// Dashboard plus the first inventory page, as printed by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub summary: InventorySummary,
    pub inventory: Page<ItemView>,
}

pub struct LendingDesk<C: Clock = SystemClock> {
    config: DeskConfig,
    clock: C,
    catalog: Catalog,
    items: ItemRegistry,
    loans: LoanBook,
    deny_list: DenyList,
    bus: Arc<InMemoryEventBus<DeskEvent>>,
    published_items: usize,
    published_loans: usize,
}

impl<C: Clock> LendingDesk<C> {
    pub fn new(config: DeskConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            catalog: Catalog::in_memory(),
            items: ItemRegistry::in_memory(),
            loans: LoanBook::in_memory(),
            deny_list: DenyList::in_memory(),
            bus: Arc::new(InMemoryEventBus::new()),
            published_items: 0,
            published_loans: 0,
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Receive every item and loan event committed after this call.
    pub fn subscribe(&self) -> Subscription<DeskEvent> {
        self.bus.subscribe()
    }

    // ---- catalog ----

    pub fn catalog_entity(
        &self,
        ctx: &RequestContext,
        kind: CatalogKind,
        id: CatalogEntityId,
    ) -> DeskResult<CatalogEntity> {
        self.guard(ctx, Permission::CatalogRead, "catalog.get")?;
        Ok(self.catalog.get(kind, id)?)
    }

    pub fn list_catalog(
        &self,
        ctx: &RequestContext,
        kind: CatalogKind,
        options: ListOptions,
        filter: &CatalogFilter,
    ) -> DeskResult<Vec<CatalogEntity>> {
        self.guard(ctx, Permission::CatalogRead, "catalog.list")?;
        Ok(filter_catalog(&self.catalog.list(kind, options), filter))
    }

    /// Root-first ancestor chain, for breadcrumbs.
    pub fn catalog_path(
        &self,
        ctx: &RequestContext,
        kind: CatalogKind,
        id: CatalogEntityId,
    ) -> DeskResult<Vec<CatalogEntity>> {
        self.guard(ctx, Permission::CatalogRead, "catalog.path")?;
        Ok(self.catalog.ancestors(kind, id)?)
    }

    pub fn create_catalog_entity(
        &mut self,
        ctx: &RequestContext,
        kind: CatalogKind,
        draft: CatalogDraft,
    ) -> DeskResult<CatalogEntity> {
        self.guard(ctx, Permission::CatalogManage, "catalog.create")?;
        let result = self.catalog.create(kind, draft);
        let entity = self.outcome(ctx, "catalog.create", result)?;
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            kind = %kind,
            entity_id = %entity.id_typed(),
            name = entity.name(),
            "catalog entity created"
        );
        Ok(entity)
    }

    pub fn update_catalog_entity(
        &mut self,
        ctx: &RequestContext,
        kind: CatalogKind,
        id: CatalogEntityId,
        draft: CatalogDraft,
    ) -> DeskResult<CatalogEntity> {
        self.guard(ctx, Permission::CatalogManage, "catalog.update")?;
        let result = self.catalog.update(kind, id, draft);
        let entity = self.outcome(ctx, "catalog.update", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), kind = %kind, entity_id = %id, "catalog entity updated");
        Ok(entity)
    }

    /// Soft-deactivate; the result says whether active records still point
    /// at the entity.
    pub fn deactivate_catalog_entity(
        &mut self,
        ctx: &RequestContext,
        kind: CatalogKind,
        id: CatalogEntityId,
    ) -> DeskResult<Deactivation> {
        self.guard(ctx, Permission::CatalogManage, "catalog.deactivate")?;
        let result = self.catalog.deactivate(kind, id, &self.items);
        let outcome = self.outcome(ctx, "catalog.deactivate", result)?;
        if outcome.still_referenced {
            warn!(kind = %kind, entity_id = %id, "deactivated catalog entity is still referenced");
        }
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            kind = %kind,
            entity_id = %id,
            already_inactive = outcome.already_inactive,
            "catalog entity deactivated"
        );
        Ok(outcome)
    }

    pub fn reactivate_catalog_entity(
        &mut self,
        ctx: &RequestContext,
        kind: CatalogKind,
        id: CatalogEntityId,
    ) -> DeskResult<CatalogEntity> {
        self.guard(ctx, Permission::CatalogManage, "catalog.reactivate")?;
        let result = self.catalog.reactivate(kind, id);
        let entity = self.outcome(ctx, "catalog.reactivate", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), kind = %kind, entity_id = %id, "catalog entity reactivated");
        Ok(entity)
    }

    // ---- inventory ----

    pub fn register_item(&mut self, ctx: &RequestContext, new_item: NewItem) -> DeskResult<ItemView> {
        self.guard(ctx, Permission::InventoryManage, "item.register")?;
        let now = self.clock.now();
        let result = self.items.create(new_item, &self.catalog, now);
        let item = self.outcome(ctx, "item.register", result)?;
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            item_id = %item.id_typed(),
            barcode = item.barcode(),
            "item registered"
        );
        self.publish_pending();
        Ok(self.view_of(item.id_typed(), now)?)
    }

    pub fn update_item(&mut self, ctx: &RequestContext, id: ItemId, patch: ItemPatch) -> DeskResult<ItemView> {
        self.guard(ctx, Permission::InventoryManage, "item.update")?;
        let now = self.clock.now();
        let result = self.items.update(id, patch, &self.catalog, now);
        self.outcome(ctx, "item.update", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), item_id = %id, "item updated");
        self.publish_pending();
        Ok(self.view_of(id, now)?)
    }

    pub fn deactivate_item(&mut self, ctx: &RequestContext, id: ItemId) -> DeskResult<ItemView> {
        self.guard(ctx, Permission::InventoryManage, "item.deactivate")?;
        let now = self.clock.now();
        let result = self.items.deactivate(id, now);
        self.outcome(ctx, "item.deactivate", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), item_id = %id, "item deactivated");
        self.publish_pending();
        Ok(self.view_of(id, now)?)
    }

    pub fn reactivate_item(&mut self, ctx: &RequestContext, id: ItemId) -> DeskResult<ItemView> {
        self.guard(ctx, Permission::InventoryManage, "item.reactivate")?;
        let now = self.clock.now();
        let result = self.items.reactivate(id, now);
        self.outcome(ctx, "item.reactivate", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), item_id = %id, "item reactivated");
        self.publish_pending();
        Ok(self.view_of(id, now)?)
    }

    /// Hard delete. Only items no loan ever referenced can go.
    pub fn purge_item(&mut self, ctx: &RequestContext, id: ItemId) -> DeskResult<()> {
        self.guard(ctx, Permission::InventoryManage, "item.purge")?;
        let now = self.clock.now();
        let result = self.items.purge(id, &self.loans, now);
        let item = self.outcome(ctx, "item.purge", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), item_id = %id, barcode = item.barcode(), "item purged");
        self.publish_pending();
        Ok(())
    }

    pub fn item(&self, ctx: &RequestContext, id: ItemId) -> DeskResult<ItemView> {
        self.guard(ctx, Permission::InventoryRead, "item.get")?;
        Ok(self.view_of(id, self.clock.now())?)
    }

    /// Scanner lookup.
    pub fn item_by_barcode(&self, ctx: &RequestContext, barcode: &str) -> DeskResult<Option<ItemView>> {
        self.guard(ctx, Permission::InventoryRead, "item.by_barcode")?;
        let now = self.clock.now();
        Ok(self.items.find_by_barcode(barcode).map(|item| {
            let status = derive_status(&item, &self.catalog, &self.loans, now);
            ItemView { item, status }
        }))
    }

    /// Active items matching `filter`, one page at a time.
    pub fn inventory(
        &self,
        ctx: &RequestContext,
        filter: &ItemFilter,
        page: usize,
        page_size: Option<usize>,
    ) -> DeskResult<Page<ItemView>> {
        self.guard(ctx, Permission::InventoryRead, "item.list")?;
        let views = self.item_views(self.clock.now());
        let matching = filter_items(&views, filter);
        Ok(Page::of(&matching, page, self.config.page_size(page_size)))
    }

    // ---- loans ----

    pub fn request_loan(&mut self, ctx: &RequestContext, form: LoanForm) -> DeskResult<LoanView> {
        self.guard(ctx, Permission::LoansRequest, "loan.request")?;
        let now = self.clock.now();
        let start_at = form.start_at.unwrap_or(now);
        let due_at = form
            .due_at
            .unwrap_or_else(|| start_at + Duration::days(i64::from(self.config.default_loan_days)));
        let request = LoanRequest {
            item_id: form.item_id,
            requester: form.requester,
            start_at,
            due_at,
            details: form.details,
        };

        let result = self.loans.request_loan(request, &self.items, &self.deny_list, now);
        let loan = self.outcome(ctx, "loan.request", result)?;
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            loan_id = %loan.id_typed(),
            item_id = %loan.item_id(),
            due_at = %loan.due_at(),
            "loan opened"
        );
        self.publish_pending();
        self.loan_view(loan.id_typed(), now)
    }

    /// Record a return; `returned_at` defaults to now.
    pub fn return_loan(
        &mut self,
        ctx: &RequestContext,
        id: LoanId,
        returned_at: Option<DateTime<Utc>>,
    ) -> DeskResult<LoanView> {
        self.guard(ctx, Permission::LoansManage, "loan.return")?;
        let now = self.clock.now();
        let result = self.loans.return_loan(id, returned_at.unwrap_or(now), now);
        let loan = self.outcome(ctx, "loan.return", result)?;
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            loan_id = %id,
            item_id = %loan.item_id(),
            "loan returned"
        );
        self.publish_pending();
        self.loan_view(id, now)
    }

    pub fn loan(&self, ctx: &RequestContext, id: LoanId) -> DeskResult<LoanView> {
        self.guard(ctx, Permission::LoansRead, "loan.get")?;
        self.loan_view(id, self.clock.now())
    }

    pub fn loans(
        &self,
        ctx: &RequestContext,
        filter: &LoanFilter,
        sort: LoanSort,
        page: usize,
        page_size: Option<usize>,
    ) -> DeskResult<Page<LoanView>> {
        self.guard(ctx, Permission::LoansRead, "loan.list")?;
        let views = self.loans.views(&self.items, self.clock.now());
        let mut matching = filter_loans(&views, filter);
        sort_loans(&mut matching, sort);
        Ok(Page::of(&matching, page, self.config.page_size(page_size)))
    }

    // ---- deny-list ----

    pub fn sanction(&mut self, ctx: &RequestContext, entry: NewDenyListEntry) -> DeskResult<DenyListEntry> {
        self.guard(ctx, Permission::DenyListManage, "deny_list.add")?;
        let now = self.clock.now();
        let result = self.deny_list.add(entry, now);
        let entry = self.outcome(ctx, "deny_list.add", result)?;
        info!(
            actor = %ctx.actor_id(),
            role = %ctx.role(),
            entry_id = %entry.id(),
            in_force = entry.in_force(now),
            "requester deny-listed"
        );
        Ok(entry)
    }

    pub fn lift_sanction(&mut self, ctx: &RequestContext, id: DenyListEntryId) -> DeskResult<DenyListEntry> {
        self.guard(ctx, Permission::DenyListManage, "deny_list.lift")?;
        let result = self.deny_list.lift(id, self.clock.now());
        let entry = self.outcome(ctx, "deny_list.lift", result)?;
        info!(actor = %ctx.actor_id(), role = %ctx.role(), entry_id = %id, "sanction lifted");
        Ok(entry)
    }

    /// Entries in force now, or every entry on record.
    pub fn deny_list(&self, ctx: &RequestContext, in_force_only: bool) -> DeskResult<Vec<DenyListEntry>> {
        self.guard(ctx, Permission::DenyListManage, "deny_list.list")?;
        Ok(if in_force_only {
            self.deny_list.in_force(self.clock.now())
        } else {
            self.deny_list.list()
        })
    }

    // ---- dashboard ----

    pub fn dashboard(&self, ctx: &RequestContext) -> DeskResult<InventorySummary> {
        self.guard(ctx, Permission::InventoryRead, "dashboard")?;
        self.guard(ctx, Permission::LoansRead, "dashboard")?;
        let now = self.clock.now();
        Ok(summarize(&self.item_views(now), &self.loans.views(&self.items, now), &self.catalog))
    }

    pub fn snapshot(&self, ctx: &RequestContext) -> DeskResult<Snapshot> {
        Ok(Snapshot {
            generated_at: self.clock.now(),
            summary: self.dashboard(ctx)?,
            inventory: self.inventory(ctx, &ItemFilter::default(), 1, None)?,
        })
    }

    // ---- internals ----

    fn guard(&self, ctx: &RequestContext, permission: Permission, operation: &'static str) -> DeskResult<()> {
        ctx.require(permission).map_err(|err| {
            warn!(actor = %ctx.actor_id(), role = %ctx.role(), operation, code = "forbidden", "{err}");
            DeskError::from(err)
        })
    }

    fn outcome<T>(&self, ctx: &RequestContext, operation: &'static str, result: DomainResult<T>) -> DeskResult<T> {
        result.map_err(|err| {
            warn!(actor = %ctx.actor_id(), role = %ctx.role(), operation, code = err.code(), "{err}");
            DeskError::from(err)
        })
    }

    fn item_views(&self, now: DateTime<Utc>) -> Vec<ItemView> {
        self.items.list_with_status(&self.catalog, &self.loans, now, |_| true)
    }

    fn view_of(&self, id: ItemId, now: DateTime<Utc>) -> DomainResult<ItemView> {
        let item = self.items.get(id)?;
        let status = derive_status(&item, &self.catalog, &self.loans, now);
        Ok(ItemView { item, status })
    }

    fn loan_view(&self, id: LoanId, now: DateTime<Utc>) -> DeskResult<LoanView> {
        let loan = self.loans.get(id)?;
        let (item_name, item_barcode) = self
            .items
            .get(loan.item_id())
            .map(|item| (item.name().to_string(), item.barcode().to_string()))
            .unwrap_or_default();
        Ok(LoanView {
            status: loan.status_at(now),
            loan,
            item_name,
            item_barcode,
        })
    }

    /// Publish journal entries committed since the last call. The journals are
    /// the record; a failed publish is logged and not retried.
    fn publish_pending(&mut self) {
        let items = &self.items.journal()[self.published_items..];
        let loans = &self.loans.journal()[self.published_loans..];
        let pending: Vec<DeskEvent> = items
            .iter()
            .cloned()
            .map(DeskEvent::from)
            .chain(loans.iter().cloned().map(DeskEvent::from))
            .collect();
        self.published_items = self.items.journal().len();
        self.published_loans = self.loans.journal().len();

        for event in pending {
            if let Err(err) = self.bus.publish(event) {
                warn!(error = ?err, "event publish failed");
            }
        }
    }
}

impl Default for LendingDesk {
    fn default() -> Self {
        Self::new(DeskConfig::default(), SystemClock)
    }
}

impl<C: Clock> std::fmt::Debug for LendingDesk<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingDesk")
            .field("config", &self.config)
            .field("items", &self.items.list(ItemListOptions { include_inactive: true }).len())
            .field("loans", &self.loans.list().len())
            .field("deny_list", &self.deny_list.list().len())
            .finish_non_exhaustive()
    }
}
