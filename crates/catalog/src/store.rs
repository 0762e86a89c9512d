use serde::{Deserialize, Serialize};

use loandesk_core::{DomainError, DomainResult, InMemoryRepository, Repository};

use crate::entity::{CatalogDraft, CatalogEntity, CatalogEntityId, CatalogKind};
use crate::hierarchy;

/// Lookup used by other modules to validate references into the catalog.
pub trait CatalogLookup {
    fn find(&self, kind: CatalogKind, id: CatalogEntityId) -> Option<CatalogEntity>;

    /// Resolve a reference that must point at an existing, active entity of `kind`.
    fn resolve_active(&self, kind: CatalogKind, id: CatalogEntityId) -> DomainResult<CatalogEntity> {
        match self.find(kind, id) {
            Some(entity) if entity.active() => Ok(entity),
            Some(_) => Err(DomainError::reference(format!("{kind} {id} is deactivated"))),
            None => Err(DomainError::reference(format!("{kind} {id} does not exist"))),
        }
    }
}

/// Answers whether something outside the catalog still points at an entity.
pub trait ReferenceIndex {
    fn is_referenced(&self, kind: CatalogKind, id: CatalogEntityId) -> bool;
}

/// A reference index that knows of no outside references.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoReferences;

impl ReferenceIndex for NoReferences {
    fn is_referenced(&self, _kind: CatalogKind, _id: CatalogEntityId) -> bool {
        false
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub include_inactive: bool,
}

/// Outcome of a deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deactivation {
    pub entity: CatalogEntity,
    /// Active items, child entities or locations still point at this entity.
    pub still_referenced: bool,
    /// The entity was already inactive; nothing changed.
    pub already_inactive: bool,
}

/// Catalog entity store.
#[derive(Debug, Clone)]
pub struct Catalog<R = InMemoryRepository<CatalogEntityId, CatalogEntity>> {
    repo: R,
}

impl Catalog {
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<R> Catalog<R>
where
    R: Repository<CatalogEntityId, CatalogEntity>,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get(&self, kind: CatalogKind, id: CatalogEntityId) -> DomainResult<CatalogEntity> {
        self.repo
            .get(&id)
            .filter(|e| e.kind() == kind)
            .ok_or_else(|| DomainError::not_found(format!("{kind} {id}")))
    }

    pub fn list(&self, kind: CatalogKind, options: ListOptions) -> Vec<CatalogEntity> {
        self.repo
            .list()
            .into_iter()
            .filter(|e| e.kind() == kind && (options.include_inactive || e.active()))
            .collect()
    }

    pub fn create(&mut self, kind: CatalogKind, draft: CatalogDraft) -> DomainResult<CatalogEntity> {
        let draft = draft.normalized(kind)?;
        self.check_unique(kind, None, &draft.name, draft.code.as_deref())?;
        self.check_links(kind, None, &draft)?;

        let id = CatalogEntityId::generate();
        let entity = CatalogEntity::from_draft(id, draft);
        self.repo.upsert(id, entity.clone());
        Ok(entity)
    }

    pub fn update(
        &mut self,
        kind: CatalogKind,
        id: CatalogEntityId,
        draft: CatalogDraft,
    ) -> DomainResult<CatalogEntity> {
        let mut entity = self.get(kind, id)?;
        let draft = draft.normalized(kind)?;
        if entity.active() {
            self.check_unique(kind, Some(id), &draft.name, draft.code.as_deref())?;
        }
        self.check_links(kind, Some(id), &draft)?;

        entity.revise(draft);
        self.repo.upsert(id, entity.clone());
        Ok(entity)
    }

    /// Soft-deactivate. Idempotent, never cascades.
    pub fn deactivate(
        &mut self,
        kind: CatalogKind,
        id: CatalogEntityId,
        references: &dyn ReferenceIndex,
    ) -> DomainResult<Deactivation> {
        let mut entity = self.get(kind, id)?;
        let already_inactive = !entity.active();
        let still_referenced = references.is_referenced(kind, id) || self.has_active_dependents(id);

        if !already_inactive {
            entity.set_active(false);
            self.repo.upsert(id, entity.clone());
        }

        Ok(Deactivation {
            entity,
            still_referenced,
            already_inactive,
        })
    }

    /// Re-activate a deactivated entity, re-checking uniqueness against the
    /// entities that became active in the meantime.
    pub fn reactivate(&mut self, kind: CatalogKind, id: CatalogEntityId) -> DomainResult<CatalogEntity> {
        let mut entity = self.get(kind, id)?;
        if entity.active() {
            return Ok(entity);
        }
        self.check_unique(kind, Some(id), entity.name(), entity.code())?;

        entity.set_active(true);
        self.repo.upsert(id, entity.clone());
        Ok(entity)
    }

    /// Ancestor chain of an entity, root first (empty for roots and flat kinds).
    pub fn ancestors(&self, kind: CatalogKind, id: CatalogEntityId) -> DomainResult<Vec<CatalogEntity>> {
        let entity = self.get(kind, id)?;
        Ok(hierarchy::ancestors(&self.repo, &entity))
    }

    /// Direct children of an entity, active or not.
    pub fn children(&self, kind: CatalogKind, id: CatalogEntityId) -> Vec<CatalogEntity> {
        self.repo
            .list()
            .into_iter()
            .filter(|e| e.kind() == kind && e.parent_id() == Some(id))
            .collect()
    }

    fn check_unique(
        &self,
        kind: CatalogKind,
        exclude: Option<CatalogEntityId>,
        name: &str,
        code: Option<&str>,
    ) -> DomainResult<()> {
        for other in self.list(kind, ListOptions::default()) {
            if Some(other.id_typed()) == exclude {
                continue;
            }
            if same_key(other.name(), name) {
                return Err(DomainError::validation(format!(
                    "an active {kind} named '{name}' already exists"
                )));
            }
            if let (Some(mine), Some(theirs)) = (code, other.code()) {
                if same_key(mine, theirs) {
                    return Err(DomainError::validation(format!(
                        "an active {kind} with code '{mine}' already exists"
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_links(
        &self,
        kind: CatalogKind,
        id: Option<CatalogEntityId>,
        draft: &CatalogDraft,
    ) -> DomainResult<()> {
        if let Some(parent_id) = draft.parent_id {
            hierarchy::check_parent(&self.repo, kind, id, parent_id)?;
        }
        if let Some(warehouse_id) = draft.details.warehouse_id() {
            self.resolve_active(CatalogKind::Warehouse, warehouse_id)?;
        }
        Ok(())
    }

    fn has_active_dependents(&self, id: CatalogEntityId) -> bool {
        self.repo.list().iter().any(|e| {
            e.active()
                && e.id_typed() != id
                && (e.parent_id() == Some(id) || e.details().warehouse_id() == Some(id))
        })
    }
}

fn same_key(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl<R> CatalogLookup for Catalog<R>
where
    R: Repository<CatalogEntityId, CatalogEntity>,
{
    fn find(&self, kind: CatalogKind, id: CatalogEntityId) -> Option<CatalogEntity> {
        self.repo.get(&id).filter(|e| e.kind() == kind)
    }
}
