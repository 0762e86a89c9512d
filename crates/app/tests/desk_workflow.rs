use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use loandesk_app::seed::demo_desk;
use loandesk_app::{DeskConfig, DeskError, LendingDesk, LoanForm, RequestContext};
use loandesk_auth::Role;
use loandesk_catalog::{CatalogDetails, CatalogDraft, CatalogEntityId, CatalogKind};
use loandesk_core::{DomainError, ManualClock};
use loandesk_events::Event;
use loandesk_inventory::{ItemClassification, ItemId, ItemStatus, NewItem};
use loandesk_loans::{LoanStatus, NewDenyListEntry, Requester, RequesterRole, SanctionTerm};
use loandesk_query::{ItemFilter, LoanFilter, LoanSort, StatusTab};

type Desk = LendingDesk<Arc<ManualClock>>;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

fn apr(d: u32) -> DateTime<Utc> {
    at(2024, 4, d)
}

fn admin() -> RequestContext {
    RequestContext::for_role("Administrador", Role::Admin)
}

fn student() -> RequestContext {
    RequestContext::for_role("Carlos Méndez", Role::Student)
}

fn category_draft(name: &str, code: &str) -> CatalogDraft {
    CatalogDraft::new(
        name,
        CatalogDetails::Category {
            useful_life_years: 5,
            depreciation_bps: 2000,
        },
    )
    .with_code(code)
}

struct Fixture {
    desk: Desk,
    clock: Arc<ManualClock>,
    category: CatalogEntityId,
    item: ItemId,
}

/// A desk holding one item with `quantity` units.
fn fixture(quantity: i64) -> Fixture {
    let clock = Arc::new(ManualClock::new(apr(1)));
    let mut desk = LendingDesk::new(DeskConfig::default(), clock.clone());
    let admin = admin();

    let category = desk
        .create_catalog_entity(&admin, CatalogKind::Category, category_draft("Electrónica", "CAT001"))
        .unwrap()
        .id_typed();
    let item_type = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::ItemType,
            CatalogDraft::new("Equipos de Cómputo", CatalogDetails::ItemType).with_code("IT002"),
        )
        .unwrap()
        .id_typed();
    let warehouse = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Warehouse,
            CatalogDraft::new(
                "Almacén Central",
                CatalogDetails::Warehouse {
                    address: "Calle Principal 123".into(),
                    responsible: None,
                },
            ),
        )
        .unwrap()
        .id_typed();
    let location = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Location,
            CatalogDraft::new(
                "Ubicación Central",
                CatalogDetails::Location {
                    warehouse_id: warehouse,
                    building: "A".into(),
                    floor: "1".into(),
                    capacity: 50,
                },
            ),
        )
        .unwrap()
        .id_typed();
    let item = desk
        .register_item(
            &admin,
            NewItem {
                barcode: "TEC-001".into(),
                name: "MacBook Pro 16''".into(),
                description: "MacBook Pro con chip M1 Pro".into(),
                quantity_on_hand: quantity,
                cost_cents: 249_999,
                image_ref: None,
                classification: ItemClassification::new(category, item_type, location),
            },
        )
        .unwrap()
        .item
        .id_typed();

    Fixture {
        desk,
        clock,
        category,
        item,
    }
}

fn carlos() -> Requester {
    Requester::new("Carlos Méndez", "0912345678", RequesterRole::Student)
}

fn domain_error(err: DeskError) -> DomainError {
    match err {
        DeskError::Domain(err) => err,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

#[test]
fn scenario_overlapping_loan_on_single_unit_is_rejected() {
    let mut fx = fixture(1);
    let ctx = student();

    let a = fx
        .desk
        .request_loan(&ctx, LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();
    assert_eq!(a.status, LoanStatus::Active);

    let err = fx
        .desk
        .request_loan(&ctx, LoanForm::new(fx.item, carlos()).window(apr(5), apr(10)))
        .unwrap_err();
    assert!(matches!(domain_error(err), DomainError::Capacity(_)));
}

#[test]
fn scenario_returned_loan_does_not_count_against_capacity() {
    let mut fx = fixture(1);

    let a = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();
    let returned = fx.desk.return_loan(&admin(), a.loan.id_typed(), Some(apr(6))).unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);

    let b = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(5), apr(10)))
        .unwrap();
    assert_eq!(b.status, LoanStatus::Active);
}

#[test]
fn scenario_unreturned_loan_turns_overdue() {
    let mut fx = fixture(1);
    let loan = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();

    fx.clock.set(apr(10));
    let view = fx.desk.loan(&student(), loan.loan.id_typed()).unwrap();
    assert_eq!(view.status, LoanStatus::Overdue);

    let overdue = fx
        .desk
        .loans(&student(), &LoanFilter::tab(StatusTab::Overdue), LoanSort::NewestFirst, 1, None)
        .unwrap();
    assert_eq!(overdue.total_items, 1);
}

#[test]
fn overdue_loan_does_not_block_windows_after_its_due_date() {
    let mut fx = fixture(1);
    let late = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();

    fx.clock.set(apr(10));
    assert_eq!(fx.desk.loan(&student(), late.loan.id_typed()).unwrap().status, LoanStatus::Overdue);

    let next = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(12), apr(15)))
        .unwrap();
    assert_eq!(next.status, LoanStatus::Active);

    let err = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(14), apr(16)))
        .unwrap_err();
    assert!(matches!(domain_error(err), DomainError::Capacity(_)));
}

#[test]
fn scenario_double_return_is_invalid_state() {
    let mut fx = fixture(1);
    let loan = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();

    fx.clock.set(apr(6));
    fx.desk.return_loan(&admin(), loan.loan.id_typed(), None).unwrap();
    fx.clock.set(apr(7));
    let err = fx.desk.return_loan(&admin(), loan.loan.id_typed(), None).unwrap_err();
    assert_eq!(err.code(), "invalid_state");

    let view = fx.desk.loan(&student(), loan.loan.id_typed()).unwrap();
    assert_eq!(view.loan.returned_at(), Some(apr(6)));
}

#[test]
fn scenario_deny_listed_requester_until_sanction_expires() {
    let mut fx = fixture(3);
    fx.desk
        .sanction(
            &admin(),
            NewDenyListEntry {
                full_name: "Juan Pérez".into(),
                national_id: Some("123456789".into()),
                reason: "Pérdida de equipo".into(),
                incident_date: apr(1),
                sanction: SanctionTerm::Until(at(2024, 12, 31)),
            },
        )
        .unwrap();
    let juan = || Requester::new("Juan Pérez", "123456789", RequesterRole::Student);

    fx.clock.set(at(2024, 11, 15));
    let err = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, juan()))
        .unwrap_err();
    assert_eq!(err.code(), "deny_list_error");

    fx.clock.set(at(2025, 1, 15));
    let loan = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, juan()))
        .unwrap();
    assert_eq!(loan.loan.due_at(), at(2025, 1, 15) + Duration::days(7));
}

#[test]
fn scenario_category_cycle_is_rejected() {
    let mut fx = fixture(1);
    let admin = admin();
    let parent = fx.category;
    let child = fx
        .desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Category,
            category_draft("Computadoras", "CAT003").with_parent(parent),
        )
        .unwrap();

    let err = fx
        .desk
        .update_catalog_entity(
            &admin,
            CatalogKind::Category,
            parent,
            category_draft("Electrónica", "CAT001").with_parent(child.id_typed()),
        )
        .unwrap_err();
    assert_eq!(err.code(), "cycle_error");

    let path = fx
        .desk
        .catalog_path(&admin, CatalogKind::Category, child.id_typed())
        .unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].id_typed(), parent);
}

#[test]
fn borrowers_cannot_manage_the_desk() {
    let mut fx = fixture(1);
    let loan = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()).window(apr(1), apr(8)))
        .unwrap();

    let err = fx.desk.return_loan(&student(), loan.loan.id_typed(), None).unwrap_err();
    assert!(matches!(err, DeskError::Forbidden(_)));
    assert_eq!(err.code(), "forbidden");

    let teacher = RequestContext::for_role("Ana Gómez", Role::Teacher);
    let err = fx
        .desk
        .create_catalog_entity(&teacher, CatalogKind::Category, category_draft("Muebles", "CAT002"))
        .unwrap_err();
    assert!(matches!(err, DeskError::Forbidden(_)));
    assert!(fx.desk.deny_list(&teacher, false).is_err());
}

#[test]
fn mutations_publish_domain_events() {
    let mut fx = fixture(2);
    let events = fx.desk.subscribe();

    let loan = fx
        .desk
        .request_loan(&student(), LoanForm::new(fx.item, carlos()))
        .unwrap();
    fx.desk.return_loan(&admin(), loan.loan.id_typed(), None).unwrap();

    let types: Vec<_> = events.drain().iter().map(|e| e.event_type()).collect();
    assert_eq!(types, ["loans.loan.opened", "loans.loan.returned"]);
}

#[test]
fn item_status_tracks_loans_and_purge_is_guarded() {
    let mut fx = fixture(1);
    let ctx = student();
    assert_eq!(fx.desk.item(&ctx, fx.item).unwrap().status, ItemStatus::Available);

    fx.desk
        .request_loan(&ctx, LoanForm::new(fx.item, carlos()).window(apr(1), apr(3)))
        .unwrap();
    assert_eq!(fx.desk.item(&ctx, fx.item).unwrap().status, ItemStatus::InUse);

    let by_barcode = fx.desk.item_by_barcode(&ctx, " tec-001 ").unwrap().unwrap();
    assert_eq!(by_barcode.item.id_typed(), fx.item);

    let err = fx.desk.purge_item(&admin(), fx.item).unwrap_err();
    assert_eq!(err.code(), "invalid_state");
}

#[test]
fn purging_an_unused_item_is_published() {
    let mut fx = fixture(1);
    let events = fx.desk.subscribe();

    fx.desk.purge_item(&admin(), fx.item).unwrap();

    let published = events.drain();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event_type(), "inventory.item.purged");
    let err = fx.desk.item(&student(), fx.item).unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn demo_desk_snapshot() {
    let clock = Arc::new(ManualClock::new(apr(1)));
    let desk = demo_desk(DeskConfig::default(), clock).unwrap();
    let ctx = admin();

    let snapshot = desk.snapshot(&ctx).unwrap();
    assert_eq!(snapshot.summary.total_items, 8);
    assert_eq!(snapshot.summary.active_loans, 2);
    assert_eq!(snapshot.summary.by_status.maintenance, 1);
    assert_eq!(snapshot.inventory.total_pages, 1);
    assert_eq!(snapshot.inventory.items.len(), 8);

    let search = desk
        .inventory(&ctx, &ItemFilter::default().search("macbook"), 1, None)
        .unwrap();
    assert_eq!(search.items[0].item.barcode(), "TEC-001");

    let sanctioned = desk.deny_list(&ctx, true).unwrap();
    assert_eq!(sanctioned.len(), 1);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["summary"]["total_items"], 8);
}
