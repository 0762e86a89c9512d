//! Domain events and in-process distribution.
//!
//! Aggregates in the domain crates emit events; the application layer publishes
//! them on an [`EventBus`] so hosts can drive notifications (due-date reminders,
//! overdue alerts) without the domain knowing about them.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
