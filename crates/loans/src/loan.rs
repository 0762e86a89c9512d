use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use loandesk_events::Event;
use loandesk_inventory::ItemId;

use crate::requester::Requester;
use crate::window::{LoanWindow, UnitHold};

/// Loan identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub AggregateId);

impl LoanId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for LoanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Derived loan status. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn is_outstanding(&self) -> bool {
        !matches!(self, LoanStatus::Returned)
    }
}

impl core::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form context captured by the loan request form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoanDetails {
    pub purpose: Option<String>,
    pub event: Option<String>,
    /// Where the item will be used.
    pub destination: Option<String>,
    pub notes: String,
}

/// Aggregate root: Loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    id: LoanId,
    item_id: ItemId,
    requester: Requester,
    requested_at: DateTime<Utc>,
    window: LoanWindow,
    returned_at: Option<DateTime<Utc>>,
    details: LoanDetails,
    version: u64,
    created: bool,
}

impl Loan {
    /// Create an empty, not-yet-opened aggregate instance for rehydration.
    pub fn empty(id: LoanId) -> Self {
        Self {
            id,
            item_id: ItemId::new(AggregateId::nil()),
            requester: Requester::default(),
            requested_at: DateTime::<Utc>::MIN_UTC,
            window: LoanWindow::unchecked(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MIN_UTC),
            returned_at: None,
            details: LoanDetails::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> LoanId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn window(&self) -> LoanWindow {
        self.window
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.window.start_at()
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.window.due_at()
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn details(&self) -> &LoanDetails {
        &self.details
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Status as seen at `now`. Pure: nothing is stored.
    pub fn status_at(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.returned_at.is_some() {
            LoanStatus::Returned
        } else if self.window.due_at() < now {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }

    /// What this loan holds of its item's capacity, as seen at `now`.
    pub fn hold_at(&self, now: DateTime<Utc>) -> Option<UnitHold> {
        match self.status_at(now) {
            LoanStatus::Returned => None,
            LoanStatus::Active => Some(UnitHold::Bounded(self.window)),
            LoanStatus::Overdue => Some(UnitHold::OpenEnded {
                since: self.window.start_at(),
            }),
        }
    }
}

impl AggregateRoot for Loan {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenLoan. Issued by the loan book once the request passed its
/// cross-aggregate checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLoan {
    pub loan_id: LoanId,
    pub item_id: ItemId,
    pub requester: Requester,
    pub window: LoanWindow,
    pub details: LoanDetails,
    pub requested_at: DateTime<Utc>,
}

/// Command: ReturnLoan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
    /// When the return is being recorded.
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanCommand {
    OpenLoan(OpenLoan),
    ReturnLoan(ReturnLoan),
}

/// Event: LoanOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOpened {
    pub loan_id: LoanId,
    pub item_id: ItemId,
    pub requester: Requester,
    pub window: LoanWindow,
    pub details: LoanDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LoanReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub loan_id: LoanId,
    pub item_id: ItemId,
    pub returned_at: DateTime<Utc>,
    /// The loan was past due when it came back.
    pub was_overdue: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanEvent {
    LoanOpened(LoanOpened),
    LoanReturned(LoanReturned),
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LoanEvent::LoanOpened(e) => e.loan_id,
            LoanEvent::LoanReturned(e) => e.loan_id,
        }
    }

    pub fn item_id(&self) -> ItemId {
        match self {
            LoanEvent::LoanOpened(e) => e.item_id,
            LoanEvent::LoanReturned(e) => e.item_id,
        }
    }
}

impl Event for LoanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LoanEvent::LoanOpened(_) => "loans.loan.opened",
            LoanEvent::LoanReturned(_) => "loans.loan.returned",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LoanEvent::LoanOpened(e) => e.occurred_at,
            LoanEvent::LoanReturned(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Loan {
    type Command = LoanCommand;
    type Event = LoanEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LoanEvent::LoanOpened(e) => {
                self.id = e.loan_id;
                self.item_id = e.item_id;
                self.requester = e.requester.clone();
                self.requested_at = e.occurred_at;
                self.window = e.window;
                self.details = e.details.clone();
                self.returned_at = None;
                self.created = true;
            }
            LoanEvent::LoanReturned(e) => {
                self.returned_at = Some(e.returned_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LoanCommand::OpenLoan(cmd) => self.handle_open(cmd),
            LoanCommand::ReturnLoan(cmd) => self.handle_return(cmd),
        }
    }
}

impl Loan {
    fn handle_open(&self, cmd: &OpenLoan) -> Result<Vec<LoanEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_state("loan already opened"));
        }
        if self.id != cmd.loan_id {
            return Err(DomainError::invalid_state("loan_id mismatch"));
        }
        if cmd.window.start_at() < cmd.requested_at {
            return Err(DomainError::validation(format!(
                "loan cannot start ({}) before it is requested ({})",
                cmd.window.start_at(),
                cmd.requested_at
            )));
        }
        let requester = cmd.requester.validated()?;

        Ok(vec![LoanEvent::LoanOpened(LoanOpened {
            loan_id: cmd.loan_id,
            item_id: cmd.item_id,
            requester,
            window: cmd.window,
            details: cmd.details.clone(),
            occurred_at: cmd.requested_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnLoan) -> Result<Vec<LoanEvent>, DomainError> {
        if !self.created || self.id != cmd.loan_id {
            return Err(DomainError::not_found(format!("loan {}", cmd.loan_id)));
        }
        if self.status_at(cmd.recorded_at) == LoanStatus::Returned {
            return Err(DomainError::invalid_state(format!(
                "loan {} was already returned",
                self.id
            )));
        }
        if cmd.returned_at < self.window.start_at() {
            return Err(DomainError::validation(format!(
                "return ({}) precedes loan start ({})",
                cmd.returned_at,
                self.window.start_at()
            )));
        }

        Ok(vec![LoanEvent::LoanReturned(LoanReturned {
            loan_id: self.id,
            item_id: self.item_id,
            returned_at: cmd.returned_at,
            was_overdue: self.window.due_at() < cmd.returned_at,
            occurred_at: cmd.recorded_at,
        })])
    }
}
