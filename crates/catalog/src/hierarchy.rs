//! Parent-chain rules for hierarchical kinds.

use std::collections::HashSet;

use loandesk_core::{DomainError, DomainResult, Repository};

use crate::entity::{CatalogEntity, CatalogEntityId, CatalogKind};

/// Check that `parent_id` may become the parent of `entity_id`
/// (`None` for a record that does not exist yet).
pub(crate) fn check_parent<R>(
    repo: &R,
    kind: CatalogKind,
    entity_id: Option<CatalogEntityId>,
    parent_id: CatalogEntityId,
) -> DomainResult<()>
where
    R: Repository<CatalogEntityId, CatalogEntity>,
{
    if entity_id == Some(parent_id) {
        return Err(DomainError::cycle(format!("{kind} {parent_id} cannot be its own parent")));
    }

    let parent = repo
        .get(&parent_id)
        .filter(|p| p.kind() == kind && p.active())
        .ok_or_else(|| DomainError::reference(format!("parent {kind} {parent_id} not found or inactive")))?;

    let Some(entity_id) = entity_id else {
        return Ok(());
    };

    let mut seen = HashSet::from([parent_id]);
    let mut cursor = parent.parent_id();
    while let Some(ancestor) = cursor {
        if ancestor == entity_id {
            return Err(DomainError::cycle(format!(
                "{kind} {entity_id} would become an ancestor of itself through {parent_id}"
            )));
        }
        if !seen.insert(ancestor) {
            break;
        }
        cursor = repo.get(&ancestor).and_then(|a| a.parent_id());
    }
    Ok(())
}

/// Ancestors of `entity`, root first.
pub(crate) fn ancestors<R>(repo: &R, entity: &CatalogEntity) -> Vec<CatalogEntity>
where
    R: Repository<CatalogEntityId, CatalogEntity>,
{
    let mut path = Vec::new();
    let mut seen = HashSet::from([entity.id_typed()]);
    let mut cursor = entity.parent_id();
    while let Some(id) = cursor {
        if !seen.insert(id) {
            break;
        }
        match repo.get(&id) {
            Some(ancestor) => {
                cursor = ancestor.parent_id();
                path.push(ancestor);
            }
            None => break,
        }
    }
    path.reverse();
    path
}
