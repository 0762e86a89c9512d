//! Loan lifecycle engine.
//!
//! A loan is a time-boxed reservation of one unit of an item. Its status is
//! derived on every read: `active` until its due date passes, `overdue` after
//! that, and `returned` (terminal) once a return is recorded. New loans pass
//! the deny-list gate, date validation, item resolution and a capacity check
//! over overlapping reservation windows, in that order.

pub mod book;
pub mod deny_list;
pub mod loan;
pub mod requester;
pub mod window;

pub use book::{LoanBook, LoanRequest, LoanView};
pub use deny_list::{DenyList, DenyListEntry, DenyListEntryId, NewDenyListEntry, SanctionTerm};
pub use loan::{
    Loan, LoanCommand, LoanDetails, LoanEvent, LoanId, LoanOpened, LoanReturned, LoanStatus,
    OpenLoan, ReturnLoan,
};
pub use requester::{Requester, RequesterRole};
pub use window::{LoanWindow, UnitHold};
