use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_events::Event;
use loandesk_inventory::ItemEvent;
use loandesk_loans::LoanEvent;

/// Everything the desk publishes on its bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stream", content = "event", rename_all = "snake_case")]
pub enum DeskEvent {
    Item(ItemEvent),
    Loan(LoanEvent),
}

impl From<ItemEvent> for DeskEvent {
    fn from(event: ItemEvent) -> Self {
        DeskEvent::Item(event)
    }
}

impl From<LoanEvent> for DeskEvent {
    fn from(event: LoanEvent) -> Self {
        DeskEvent::Loan(event)
    }
}

impl Event for DeskEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeskEvent::Item(e) => e.event_type(),
            DeskEvent::Loan(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            DeskEvent::Item(e) => e.version(),
            DeskEvent::Loan(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DeskEvent::Item(e) => e.occurred_at(),
            DeskEvent::Loan(e) => e.occurred_at(),
        }
    }
}
