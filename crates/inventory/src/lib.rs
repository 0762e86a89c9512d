//! Inventory domain module: the loanable item ("bien") and its derived status.
//!
//! This crate contains business rules for items, implemented purely as
//! deterministic domain logic (no IO, no storage decisions, no clock reads).

pub mod item;
pub mod registry;
pub mod status;

pub use item::{
    DeactivateItem, Item, ItemClassification, ItemCommand, ItemDeactivated, ItemDetails, ItemEvent,
    ItemId, ItemPatch, ItemPurged, ItemReactivated, ItemRegistered, ItemRevised, NewItem,
    PurgeItem, ReactivateItem, RegisterItem, ReviseItem,
};
pub use registry::{ItemListOptions, ItemRegistry};
pub use status::{ItemStatus, ItemView, LoanLedger, derive_status};
