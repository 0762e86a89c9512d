//! Catalog domain module: reference entities used to classify items.
//!
//! Categories, colors, conditions, item types, locations, warehouses,
//! materials and states share one shape (name/code/description/active) with
//! kind-specific attributes. Categories and locations form forests through
//! `parent_id`. Deactivation is a soft flag and never cascades.

pub mod entity;
mod hierarchy;
pub mod store;

pub use entity::{CatalogDetails, CatalogDraft, CatalogEntity, CatalogEntityId, CatalogKind};
pub use store::{
    Catalog, CatalogLookup, Deactivation, ListOptions, NoReferences, ReferenceIndex,
};
