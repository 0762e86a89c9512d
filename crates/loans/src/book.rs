//! Loan book: request and return workflow over the Loan aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_core::{Aggregate, DomainError, DomainResult, InMemoryRepository, Repository};
use loandesk_inventory::{Item, ItemId, ItemRegistry, LoanLedger};

use crate::deny_list::{DenyList, DenyListEntry, DenyListEntryId};
use crate::loan::{Loan, LoanCommand, LoanDetails, LoanEvent, LoanId, LoanStatus, OpenLoan, ReturnLoan};
use crate::requester::Requester;
use crate::window::LoanWindow;

/// A loan request as filled in at the desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub item_id: ItemId,
    pub requester: Requester,
    pub start_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub details: LoanDetails,
}

/// Loan read model with its status derived at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanView {
    pub loan: Loan,
    pub status: LoanStatus,
    pub item_name: String,
    pub item_barcode: String,
}

#[derive(Debug, Clone)]
pub struct LoanBook<R = InMemoryRepository<LoanId, Loan>> {
    repo: R,
    journal: Vec<LoanEvent>,
}

impl LoanBook {
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl Default for LoanBook {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<R> LoanBook<R>
where
    R: Repository<LoanId, Loan>,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            journal: Vec::new(),
        }
    }

    /// Open a loan. Checks run in a fixed order: deny-list, input, item,
    /// capacity. A rejected request leaves no trace.
    pub fn request_loan<IR, D>(
        &mut self,
        request: LoanRequest,
        items: &ItemRegistry<IR>,
        deny_list: &DenyList<D>,
        now: DateTime<Utc>,
    ) -> DomainResult<Loan>
    where
        IR: Repository<ItemId, Item>,
        D: Repository<DenyListEntryId, DenyListEntry>,
    {
        deny_list.check(&request.requester, now)?;

        let window = LoanWindow::new(request.start_at, request.due_at)?;
        if window.start_at() < now {
            return Err(DomainError::validation(format!(
                "loan cannot start ({}) before it is requested ({now})",
                window.start_at()
            )));
        }
        let requester = request.requester.validated()?;

        let item = items
            .get(request.item_id)
            .ok()
            .filter(Item::active)
            .ok_or_else(|| DomainError::not_found(format!("item {}", request.item_id)))?;

        let overlapping = self.overlapping_count(item.id_typed(), &window, now);
        if overlapping >= item.quantity_on_hand() as usize {
            return Err(DomainError::capacity(format!(
                "{} has {} unit(s) and {} overlapping loan(s) in [{}, {})",
                item.barcode(),
                item.quantity_on_hand(),
                overlapping,
                window.start_at(),
                window.due_at()
            )));
        }

        let loan_id = LoanId::generate();
        let command = LoanCommand::OpenLoan(OpenLoan {
            loan_id,
            item_id: item.id_typed(),
            requester,
            window,
            details: request.details,
            requested_at: now,
        });
        self.execute(Loan::empty(loan_id), &command)
    }

    /// Mark a loan returned at `returned_at`; `now` is when the return is
    /// recorded.
    pub fn return_loan(&mut self, id: LoanId, returned_at: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<Loan> {
        let loan = self.get(id)?;
        let command = LoanCommand::ReturnLoan(ReturnLoan {
            loan_id: id,
            returned_at,
            recorded_at: now,
        });
        self.execute(loan, &command)
    }

    pub fn get(&self, id: LoanId) -> DomainResult<Loan> {
        self.repo
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("loan {id}")))
    }

    pub fn status_of(&self, id: LoanId, now: DateTime<Utc>) -> DomainResult<LoanStatus> {
        Ok(self.get(id)?.status_at(now))
    }

    /// All loans, in request order.
    pub fn list(&self) -> Vec<Loan> {
        self.repo.list()
    }

    pub fn loans_for_item(&self, item_id: ItemId) -> Vec<Loan> {
        self.repo
            .list()
            .into_iter()
            .filter(|loan| loan.item_id() == item_id)
            .collect()
    }

    /// Loans with derived status and the item fields loan screens show.
    pub fn views<IR>(&self, items: &ItemRegistry<IR>, now: DateTime<Utc>) -> Vec<LoanView>
    where
        IR: Repository<ItemId, Item>,
    {
        self.repo
            .list()
            .into_iter()
            .map(|loan| {
                let (item_name, item_barcode) = items
                    .get(loan.item_id())
                    .map(|item| (item.name().to_string(), item.barcode().to_string()))
                    .unwrap_or_default();
                LoanView {
                    status: loan.status_at(now),
                    loan,
                    item_name,
                    item_barcode,
                }
            })
            .collect()
    }

    /// Non-returned loans on `item_id` whose own `[start, due)` overlaps
    /// `window`. An overdue loan only conflicts over its booked window.
    pub fn overlapping_count(&self, item_id: ItemId, window: &LoanWindow, now: DateTime<Utc>) -> usize {
        self.repo
            .list()
            .iter()
            .filter(|loan| loan.item_id() == item_id)
            .filter(|loan| loan.status_at(now).is_outstanding())
            .filter(|loan| loan.window().overlaps(window))
            .count()
    }

    /// Every loan event committed so far, oldest first.
    pub fn journal(&self) -> &[LoanEvent] {
        &self.journal
    }

    fn execute(&mut self, mut loan: Loan, command: &LoanCommand) -> DomainResult<Loan> {
        let events = loan.execute(command)?;
        self.repo.upsert(loan.id_typed(), loan.clone());
        self.journal.extend(events);
        Ok(loan)
    }
}

impl<R> LoanLedger for LoanBook<R>
where
    R: Repository<LoanId, Loan>,
{
    fn outstanding_units(&self, item_id: ItemId, at: DateTime<Utc>) -> u32 {
        let held = self
            .repo
            .list()
            .iter()
            .filter(|loan| loan.item_id() == item_id)
            .filter_map(|loan| loan.hold_at(at))
            .filter(|hold| hold.contains(at))
            .count();
        u32::try_from(held).unwrap_or(u32::MAX)
    }

    fn has_loans(&self, item_id: ItemId) -> bool {
        self.repo.list().iter().any(|loan| loan.item_id() == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deny_list::{NewDenyListEntry, SanctionTerm};
    use crate::requester::RequesterRole;
    use chrono::{Duration, TimeZone};
    use loandesk_catalog::{Catalog, CatalogDetails, CatalogDraft, CatalogKind};
    use loandesk_inventory::{ItemClassification, ItemStatus, NewItem};

    fn apr(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap()
    }

    struct Desk {
        catalog: Catalog,
        items: ItemRegistry,
        deny_list: DenyList,
        book: LoanBook,
    }

    fn desk_with_item(quantity: i64) -> (Desk, ItemId) {
        let mut catalog = Catalog::in_memory();
        let category = catalog
            .create(
                CatalogKind::Category,
                CatalogDraft::new(
                    "Electrónica",
                    CatalogDetails::Category {
                        useful_life_years: 5,
                        depreciation_bps: 2000,
                    },
                )
                .with_code("CAT001"),
            )
            .unwrap();
        let item_type = catalog
            .create(
                CatalogKind::ItemType,
                CatalogDraft::new("Tecnología", CatalogDetails::ItemType).with_code("TEC"),
            )
            .unwrap();
        let warehouse = catalog
            .create(
                CatalogKind::Warehouse,
                CatalogDraft::new(
                    "Bodega Central",
                    CatalogDetails::Warehouse {
                        address: "Edificio A".into(),
                        responsible: None,
                    },
                ),
            )
            .unwrap();
        let location = catalog
            .create(
                CatalogKind::Location,
                CatalogDraft::new(
                    "Laboratorio 1",
                    CatalogDetails::Location {
                        warehouse_id: warehouse.id_typed(),
                        building: "A".into(),
                        floor: "1".into(),
                        capacity: 30,
                    },
                ),
            )
            .unwrap();

        let mut items = ItemRegistry::in_memory();
        let item = items
            .create(
                NewItem {
                    barcode: "TEC-001".into(),
                    name: "MacBook Pro 16''".into(),
                    description: "Laptop para edición de video".into(),
                    quantity_on_hand: quantity,
                    cost_cents: 249_900,
                    image_ref: None,
                    classification: ItemClassification::new(
                        category.id_typed(),
                        item_type.id_typed(),
                        location.id_typed(),
                    ),
                },
                &catalog,
                apr(1),
            )
            .unwrap();

        let desk = Desk {
            catalog,
            items,
            deny_list: DenyList::in_memory(),
            book: LoanBook::in_memory(),
        };
        (desk, item.id_typed())
    }

    fn request(item_id: ItemId, start: DateTime<Utc>, due: DateTime<Utc>) -> LoanRequest {
        LoanRequest {
            item_id,
            requester: Requester::new("Carlos Méndez", "0912345678", RequesterRole::Student),
            start_at: start,
            due_at: due,
            details: LoanDetails::default(),
        }
    }

    impl Desk {
        fn request(&mut self, req: LoanRequest, now: DateTime<Utc>) -> DomainResult<Loan> {
            self.book.request_loan(req, &self.items, &self.deny_list, now)
        }
    }

    #[test]
    fn overlapping_request_on_single_unit_is_rejected() {
        let (mut desk, item) = desk_with_item(1);

        let a = desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        assert_eq!(a.status_at(apr(1)), LoanStatus::Active);

        let err = desk.request(request(item, apr(5), apr(10)), apr(1)).unwrap_err();
        assert!(matches!(err, DomainError::Capacity(_)));
        assert_eq!(desk.book.list().len(), 1);
    }

    #[test]
    fn returned_loans_free_their_unit() {
        let (mut desk, item) = desk_with_item(1);

        let a = desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        desk.book.return_loan(a.id_typed(), apr(6), apr(1)).unwrap();

        let b = desk.request(request(item, apr(5), apr(10)), apr(1)).unwrap();
        assert_eq!(b.status_at(apr(5)), LoanStatus::Active);
    }

    #[test]
    fn back_to_back_loans_do_not_conflict() {
        let (mut desk, item) = desk_with_item(1);
        desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        desk.request(request(item, apr(8), apr(10)), apr(1)).unwrap();
    }

    #[test]
    fn unreturned_loan_past_due_is_overdue() {
        let (mut desk, item) = desk_with_item(1);
        let loan = desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        assert_eq!(desk.book.status_of(loan.id_typed(), apr(10)).unwrap(), LoanStatus::Overdue);
    }

    #[test]
    fn overdue_loan_only_conflicts_over_its_own_window() {
        let (mut desk, item) = desk_with_item(1);
        let late = desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        assert_eq!(late.status_at(apr(10)), LoanStatus::Overdue);

        let later = desk.request(request(item, apr(12), apr(15)), apr(10)).unwrap();
        assert_eq!(later.status_at(apr(12)), LoanStatus::Active);
        assert_eq!(
            desk.book.overlapping_count(item, &LoanWindow::new(apr(10), apr(11)).unwrap(), apr(10)),
            0
        );
        // Still out on the shelf count until it comes back.
        assert_eq!(desk.book.outstanding_units(item, apr(10)), 1);
    }

    #[test]
    fn overdue_loan_still_counts_inside_its_window() {
        let (mut desk, item) = desk_with_item(1);
        desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        desk.request(request(item, apr(8), apr(20)), apr(1)).unwrap();

        assert_eq!(
            desk.book.overlapping_count(item, &LoanWindow::new(apr(5), apr(9)).unwrap(), apr(10)),
            2
        );
        assert_eq!(
            desk.book.overlapping_count(item, &LoanWindow::new(apr(21), apr(22)).unwrap(), apr(10)),
            0
        );
    }

    #[test]
    fn second_return_is_invalid_state() {
        let (mut desk, item) = desk_with_item(1);
        let loan = desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();
        desk.book.return_loan(loan.id_typed(), apr(6), apr(6)).unwrap();

        let err = desk.book.return_loan(loan.id_typed(), apr(7), apr(7)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(desk.book.get(loan.id_typed()).unwrap().returned_at(), Some(apr(6)));
    }

    #[test]
    fn sanctioned_requester_is_turned_away_until_expiry() {
        let (mut desk, item) = desk_with_item(3);
        let nov = Utc.with_ymd_and_hms(2024, 11, 15, 9, 0, 0).unwrap();
        let jan = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        desk.deny_list
            .add(
                NewDenyListEntry {
                    full_name: "Juan Pérez".into(),
                    national_id: Some("123456789".into()),
                    reason: "Pérdida de equipo".into(),
                    incident_date: apr(20),
                    sanction: SanctionTerm::Until(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
                },
                apr(21),
            )
            .unwrap();
        let juan = |start: DateTime<Utc>| LoanRequest {
            requester: Requester::new("Juan Pérez", "123456789", RequesterRole::Student),
            ..request(item, start, start + Duration::days(7))
        };

        let err = desk.request(juan(nov), nov).unwrap_err();
        assert!(matches!(err, DomainError::DenyListed(_)));

        // Past the sanction the request reaches input validation.
        let err = desk.request(juan(nov), jan).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(desk.request(juan(jan), jan).is_ok());
    }

    #[test]
    fn request_validates_window_and_item() {
        let (mut desk, item) = desk_with_item(1);

        let err = desk.request(request(item, apr(8), apr(1)), apr(1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = desk.request(request(item, apr(2), apr(4)), apr(3)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = desk
            .request(request(ItemId::generate(), apr(2), apr(4)), apr(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        desk.items.deactivate(item, apr(1)).unwrap();
        let err = desk.request(request(item, apr(2), apr(4)), apr(1)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn quantity_bounds_concurrent_loans() {
        let (mut desk, item) = desk_with_item(2);
        desk.request(request(item, apr(2), apr(6)), apr(1)).unwrap();
        desk.request(request(item, apr(3), apr(7)), apr(1)).unwrap();
        let err = desk.request(request(item, apr(4), apr(5)), apr(1)).unwrap_err();
        assert!(matches!(err, DomainError::Capacity(_)));
        assert_eq!(desk.book.overlapping_count(item, &LoanWindow::new(apr(4), apr(5)).unwrap(), apr(1)), 2);
    }

    #[test]
    fn item_status_follows_loans() {
        let (mut desk, item) = desk_with_item(1);
        let loan = desk.request(request(item, apr(2), apr(6)), apr(1)).unwrap();

        let status = |desk: &Desk, at| desk.items.get_status(item, &desk.catalog, &desk.book, at).unwrap();
        assert_eq!(status(&desk, apr(1)), ItemStatus::Available);
        assert_eq!(status(&desk, apr(3)), ItemStatus::InUse);
        assert_eq!(status(&desk, apr(9)), ItemStatus::InUse);

        desk.book.return_loan(loan.id_typed(), apr(9), apr(9)).unwrap();
        assert_eq!(status(&desk, apr(9)), ItemStatus::Available);
        assert!(desk.book.has_loans(item));
    }

    #[test]
    fn views_carry_item_fields_and_status() {
        let (mut desk, item) = desk_with_item(1);
        desk.request(request(item, apr(1), apr(8)), apr(1)).unwrap();

        let views = desk.book.views(&desk.items, apr(10));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, LoanStatus::Overdue);
        assert_eq!(views[0].item_name, "MacBook Pro 16''");
        assert_eq!(views[0].item_barcode, "TEC-001");
        assert_eq!(desk.book.loans_for_item(item).len(), 1);
        assert_eq!(desk.book.journal().len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn config() -> ProptestConfig {
            ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            }
        }

        fn hours(h: i64) -> DateTime<Utc> {
            apr(1) + Duration::hours(h)
        }

        proptest! {
            #![proptest_config(config())]

            #[test]
            fn accepted_loans_never_exceed_quantity(
                quantity in 1i64..4,
                requests in prop::collection::vec((0i64..48, 0i64..24), 1..30),
            ) {
                let (mut desk, item) = desk_with_item(quantity);
                let mut accepted: Vec<LoanWindow> = Vec::new();

                for (start, len) in requests {
                    let candidate = LoanWindow::new(hours(start), hours(start + len)).unwrap();
                    let result = desk.request(request(item, candidate.start_at(), candidate.due_at()), apr(1));
                    let overlapping = accepted.iter().filter(|w| w.overlaps(&candidate)).count();

                    match result {
                        Ok(_) => {
                            prop_assert!(overlapping < quantity as usize);
                            accepted.push(candidate);
                        }
                        Err(err) => {
                            prop_assert!(matches!(err, DomainError::Capacity(_)));
                            prop_assert!(overlapping >= quantity as usize);
                        }
                    }

                    for probe in 0..72 {
                        let held = accepted.iter().filter(|w| w.contains(hours(probe))).count();
                        prop_assert!(held <= quantity as usize);
                    }
                }
            }

            #[test]
            fn returned_loans_stay_returned(
                returned_after in 0i64..48,
                probes in prop::collection::vec(0i64..500, 1..10),
            ) {
                let (mut desk, item) = desk_with_item(1);
                let loan = desk.request(request(item, hours(0), hours(24)), apr(1)).unwrap();
                let returned_at = hours(returned_after);
                desk.book.return_loan(loan.id_typed(), returned_at, returned_at).unwrap();

                for probe in probes {
                    let at = hours(probe);
                    prop_assert_eq!(desk.book.status_of(loan.id_typed(), at).unwrap(), LoanStatus::Returned);
                    let again = desk.book.return_loan(loan.id_typed(), at.max(returned_at), at.max(returned_at));
                    prop_assert!(matches!(again, Err(DomainError::InvalidState(_))));
                }
                prop_assert_eq!(desk.book.journal().len(), 2);
            }

            #[test]
            fn sanctioned_requesters_are_always_rejected(
                quantity in 1i64..5,
                start in 0i64..48,
                len in 0i64..48,
                indefinite in any::<bool>(),
            ) {
                let (mut desk, item) = desk_with_item(quantity);
                let sanction = if indefinite {
                    SanctionTerm::Indefinite
                } else {
                    SanctionTerm::Until(hours(200))
                };
                desk.deny_list
                    .add(
                        NewDenyListEntry {
                            full_name: "Juan Pérez".into(),
                            national_id: Some("123456789".into()),
                            reason: "Daños".into(),
                            incident_date: apr(1) - Duration::days(30),
                            sanction,
                        },
                        apr(1),
                    )
                    .unwrap();

                let req = LoanRequest {
                    requester: Requester::new("Juan Pérez", "123456789", RequesterRole::Teacher),
                    ..request(item, hours(start), hours(start + len))
                };
                let result = desk.request(req, apr(1));
                prop_assert!(matches!(result, Err(DomainError::DenyListed(_))));
                prop_assert!(desk.book.list().is_empty());
            }
        }
    }
}
