//! Reservation windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use loandesk_core::{DomainError, DomainResult, ValueObject};

/// Half-open reservation interval `[start_at, due_at)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanWindow {
    start_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
}

impl ValueObject for LoanWindow {}

impl LoanWindow {
    pub fn new(start_at: DateTime<Utc>, due_at: DateTime<Utc>) -> DomainResult<Self> {
        if start_at > due_at {
            return Err(DomainError::validation(format!(
                "loan starts at {start_at} but is due at {due_at}"
            )));
        }
        Ok(Self { start_at, due_at })
    }

    pub(crate) fn unchecked(start_at: DateTime<Utc>, due_at: DateTime<Utc>) -> Self {
        Self { start_at, due_at }
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn length(&self) -> Duration {
        self.due_at - self.start_at
    }

    /// `[a1, b1)` and `[a2, b2)` overlap iff `a1 < b2 && a2 < b1`, so
    /// back-to-back windows sharing a boundary do not conflict.
    pub fn overlaps(&self, other: &LoanWindow) -> bool {
        self.start_at < other.due_at && other.start_at < self.due_at
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start_at <= at && at < self.due_at
    }
}

/// The span during which a non-returned loan keeps a unit physically out.
///
/// An overdue loan has no known end: the unit stays out until it comes back.
/// Capacity checks ignore this and compare loan windows directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitHold {
    Bounded(LoanWindow),
    OpenEnded { since: DateTime<Utc> },
}

impl UnitHold {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        match self {
            UnitHold::Bounded(held) => held.contains(at),
            UnitHold::OpenEnded { since } => *since <= at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap()
    }

    fn window(a: u32, b: u32) -> LoanWindow {
        LoanWindow::new(day(a), day(b)).unwrap()
    }

    #[test]
    fn start_after_due_is_rejected() {
        let err = LoanWindow::new(day(8), day(1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(LoanWindow::new(day(1), day(1)).is_ok());
    }

    #[test]
    fn overlapping_windows() {
        assert!(window(1, 8).overlaps(&window(5, 10)));
        assert!(window(5, 10).overlaps(&window(1, 8)));
        assert!(window(1, 10).overlaps(&window(3, 4)));
    }

    #[test]
    fn back_to_back_windows_do_not_conflict() {
        assert!(!window(1, 8).overlaps(&window(8, 10)));
        assert!(!window(8, 10).overlaps(&window(1, 8)));
    }

    #[test]
    fn zero_length_window_never_overlaps_its_start_boundary() {
        assert!(!window(5, 5).overlaps(&window(5, 10)));
        assert!(window(5, 5).overlaps(&window(1, 10)));
    }

    #[test]
    fn open_ended_hold_covers_every_later_instant() {
        let hold = UnitHold::OpenEnded { since: day(1) };
        assert!(hold.contains(day(30)));
        assert!(!hold.contains(day(1) - chrono::Duration::seconds(1)));
        assert!(!UnitHold::Bounded(window(1, 8)).contains(day(8)));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_window(min_len: i64) -> impl Strategy<Value = LoanWindow> {
            (0i64..10_000, min_len..5_000).prop_map(|(start, len)| {
                let start = day(1) + Duration::minutes(start);
                LoanWindow::new(start, start + Duration::minutes(len)).unwrap()
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: overlap is symmetric.
            #[test]
            fn overlap_is_symmetric(a in arb_window(0), b in arb_window(0)) {
                prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
            }

            /// Property: non-empty windows overlap iff some instant lies in both.
            #[test]
            fn overlap_matches_shared_instant(a in arb_window(1), b in arb_window(1)) {
                let latest_start = a.start_at().max(b.start_at());
                let shared = a.contains(latest_start) && b.contains(latest_start);
                prop_assert_eq!(a.overlaps(&b), shared);
            }
        }
    }
}
