//! `loandesk-app`: the lending desk facade.
//!
//! Wires the catalog, item registry, loan book and deny-list behind one
//! [`LendingDesk`], checking the caller's role on every call, logging each
//! mutation and publishing the resulting domain events.

pub mod config;
pub mod context;
pub mod desk;
pub mod errors;
pub mod events;
pub mod seed;

pub use config::{ConfigError, DeskConfig};
pub use context::RequestContext;
pub use desk::{LendingDesk, LoanForm, Snapshot};
pub use errors::{DeskError, DeskResult};
pub use events::DeskEvent;
