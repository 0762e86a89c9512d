use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use chrono::{DateTime, Duration, TimeZone, Utc};
use loandesk_catalog::{Catalog, CatalogDetails, CatalogDraft, CatalogKind};
use loandesk_inventory::{ItemClassification, ItemId, ItemRegistry, NewItem};
use loandesk_loans::{DenyList, LoanBook, LoanDetails, LoanRequest, LoanWindow, Requester, RequesterRole};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

fn setup_registry(quantity: i64) -> (ItemRegistry, ItemId) {
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
                name: "Proyector Epson".into(),
                description: String::new(),
                quantity_on_hand: quantity,
                cost_cents: 89_900,
                image_ref: None,
                classification: ItemClassification::new(category.id_typed(), item_type.id_typed(), location.id_typed()),
            },
            &catalog,
            start(),
        )
        .unwrap();
    (items, item.id_typed())
}

fn request(item_id: ItemId, from: DateTime<Utc>, hours: i64) -> LoanRequest {
    LoanRequest {
        item_id,
        requester: Requester::new("Carlos Méndez", "0912345678", RequesterRole::Student),
        start_at: from,
        due_at: from + Duration::hours(hours),
        details: LoanDetails::default(),
    }
}

/// A book holding `outstanding` back-to-back loans on one item.
fn setup_book(outstanding: usize) -> (LoanBook, ItemRegistry, ItemId) {
    let (items, item_id) = setup_registry(1);
    let deny_list = DenyList::in_memory();
    let mut book = LoanBook::in_memory();
    for i in 0..outstanding {
        let from = start() + Duration::hours(i as i64 * 2);
        book.request_loan(request(item_id, from, 2), &items, &deny_list, start())
            .unwrap();
    }
    (book, items, item_id)
}

fn bench_request_loan(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_loan");

    for outstanding in [10usize, 100, 1_000] {
        let (book, items, item_id) = setup_book(outstanding);
        let deny_list = DenyList::in_memory();
        let free_slot = start() + Duration::hours(outstanding as i64 * 2);

        group.throughput(Throughput::Elements(outstanding as u64));
        group.bench_with_input(BenchmarkId::new("accepted", outstanding), &outstanding, |b, _| {
            b.iter_batched(
                || book.clone(),
                |mut book| {
                    book.request_loan(black_box(request(item_id, free_slot, 2)), &items, &deny_list, start())
                        .unwrap()
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("rejected_capacity", outstanding), &outstanding, |b, _| {
            b.iter_batched(
                || book.clone(),
                |mut book| {
                    book.request_loan(black_box(request(item_id, start(), 1)), &items, &deny_list, start())
                        .unwrap_err()
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_overlapping_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlapping_count");

    for outstanding in [100usize, 1_000] {
        let (book, _items, item_id) = setup_book(outstanding);
        let window = LoanWindow::new(start(), start() + Duration::hours(outstanding as i64)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(outstanding), &outstanding, |b, _| {
            b.iter(|| book.overlapping_count(item_id, black_box(&window), start()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_request_loan, bench_overlapping_count);
criterion_main!(benches);
