//! Demo data matching the console's sample screens.

use chrono::Duration;

use loandesk_auth::Role;
use loandesk_catalog::{CatalogDetails, CatalogDraft, CatalogEntityId, CatalogKind};
use loandesk_core::Clock;
use loandesk_inventory::{ItemClassification, ItemPatch, NewItem};
use loandesk_loans::{LoanDetails, NewDenyListEntry, Requester, RequesterRole, SanctionTerm};

use crate::config::DeskConfig;
use crate::context::RequestContext;
use crate::desk::{LendingDesk, LoanForm};
use crate::errors::DeskResult;

struct SeedItem {
    barcode: &'static str,
    name: &'static str,
    description: &'static str,
    quantity: i64,
    cost_cents: i64,
    category: CatalogEntityId,
    item_type: CatalogEntityId,
}

/// A desk populated with demo catalog entries, items, two open loans and one
/// deny-listed requester.
pub fn demo_desk<C: Clock>(config: DeskConfig, clock: C) -> DeskResult<LendingDesk<C>> {
    let mut desk = LendingDesk::new(config, clock);
    let admin = RequestContext::for_role("Administrador", Role::Admin);

    let category = |name: &str, code: &str, description: &str, years: u32, bps: u32| {
        CatalogDraft::new(
            name,
            CatalogDetails::Category {
                useful_life_years: years,
                depreciation_bps: bps,
            },
        )
        .with_code(code)
        .with_description(description)
    };
    let electronics = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Category,
            category("Electrónica", "CAT001", "Productos electrónicos y dispositivos", 5, 2000),
        )?
        .id_typed();
    let furniture = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Category,
            category("Muebles", "CAT002", "Muebles y mobiliario", 10, 1000),
        )?
        .id_typed();
    let computers = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Category,
            category("Computadoras", "CAT003", "Equipos de cómputo y accesorios", 4, 2500).with_parent(electronics),
        )?
        .id_typed();
    desk.create_catalog_entity(
        &admin,
        CatalogKind::Category,
        category("Sillas", "CAT004", "Sillas y asientos", 8, 1250).with_parent(furniture),
    )?;

    let mut item_types = Vec::new();
    for (code, name) in [
        ("IT001", "Mobiliario"),
        ("IT002", "Equipos de Cómputo"),
        ("IT003", "Equipos de Laboratorio"),
        ("IT004", "Herramientas"),
    ] {
        let entity = desk.create_catalog_entity(
            &admin,
            CatalogKind::ItemType,
            CatalogDraft::new(name, CatalogDetails::ItemType).with_code(code),
        )?;
        item_types.push(entity.id_typed());
    }
    let (computing, laboratory, tools) = (item_types[1], item_types[2], item_types[3]);

    let central = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Warehouse,
            CatalogDraft::new(
                "Almacén Central",
                CatalogDetails::Warehouse {
                    address: "Calle Principal 123, Ciudad".into(),
                    responsible: Some("Juan Pérez".into()),
                },
            )
            .with_description("Almacén principal para productos terminados"),
        )?
        .id_typed();
    desk.create_catalog_entity(
        &admin,
        CatalogKind::Warehouse,
        CatalogDraft::new(
            "Almacén Norte",
            CatalogDetails::Warehouse {
                address: "Av. Norte 456, Ciudad".into(),
                responsible: Some("María García".into()),
            },
        )
        .with_description("Almacén para materias primas"),
    )?;
    let location = desk
        .create_catalog_entity(
            &admin,
            CatalogKind::Location,
            CatalogDraft::new(
                "Ubicación Central",
                CatalogDetails::Location {
                    warehouse_id: central,
                    building: "Edificio A".into(),
                    floor: "1".into(),
                    capacity: 200,
                },
            )
            .with_description("Ubicación principal para almacenamiento"),
        )?
        .id_typed();

    let mut repair_state = None;
    for (name, requires_maintenance) in [
        ("Nuevo", false),
        ("Usado - Buen Estado", false),
        ("En Reparación", true),
        ("Dañado", true),
    ] {
        let state = desk.create_catalog_entity(
            &admin,
            CatalogKind::State,
            CatalogDraft::new(name, CatalogDetails::State { requires_maintenance }),
        )?;
        if name == "En Reparación" {
            repair_state = Some(state.id_typed());
        }
    }
    for (name, requires_maintenance) in [
        ("Nuevo", false),
        ("Usado - Buen Estado", false),
        ("Usado - Requiere Mantenimiento", true),
        ("Dañado", true),
    ] {
        desk.create_catalog_entity(
            &admin,
            CatalogKind::Condition,
            CatalogDraft::new(name, CatalogDetails::Condition { requires_maintenance }),
        )?;
    }
    for (name, hex_code) in [("Rojo", "#FF0000"), ("Azul", "#000080"), ("Verde", "#50C878"), ("Amarillo", "#FFF700")] {
        desk.create_catalog_entity(
            &admin,
            CatalogKind::Color,
            CatalogDraft::new(name, CatalogDetails::Color { hex_code: hex_code.into() }),
        )?;
    }
    for (name, material_type) in [("Aluminio", "Metal"), ("Madera", "Natural"), ("Plástico ABS", "Polímero")] {
        desk.create_catalog_entity(
            &admin,
            CatalogKind::Material,
            CatalogDraft::new(name, CatalogDetails::Material { material_type: material_type.into() }),
        )?;
    }

    let seed_items = [
        SeedItem {
            barcode: "TEC-001",
            name: "MacBook Pro 16''",
            description: "MacBook Pro con chip M1 Pro, 16GB RAM, 512GB SSD",
            quantity: 5,
            cost_cents: 249_999,
            category: computers,
            item_type: computing,
        },
        SeedItem {
            barcode: "TEC-002",
            name: "Monitor Dell UltraSharp 27''",
            description: "Monitor 4K IPS con USB-C",
            quantity: 8,
            cost_cents: 54_999,
            category: electronics,
            item_type: computing,
        },
        SeedItem {
            barcode: "TEC-003",
            name: "Arduino Starter Kit",
            description: "Kit completo para principiantes con Arduino UNO",
            quantity: 15,
            cost_cents: 8_999,
            category: electronics,
            item_type: laboratory,
        },
        SeedItem {
            barcode: "TEC-004",
            name: "Raspberry Pi 4",
            description: "Raspberry Pi 4 Model B, 8GB RAM",
            quantity: 10,
            cost_cents: 7_599,
            category: computers,
            item_type: computing,
        },
        SeedItem {
            barcode: "TEC-005",
            name: "Microscopio Digital",
            description: "Microscopio digital USB con amplificación 1000x",
            quantity: 3,
            cost_cents: 19_999,
            category: electronics,
            item_type: laboratory,
        },
        SeedItem {
            barcode: "TEC-006",
            name: "Impresora 3D Creality",
            description: "Impresora 3D Creality Ender 3 V2",
            quantity: 2,
            cost_cents: 27_999,
            category: computers,
            item_type: computing,
        },
        SeedItem {
            barcode: "TEC-007",
            name: "Tableta Gráfica Wacom",
            description: "Tableta gráfica Wacom Intuos Pro Medium",
            quantity: 5,
            cost_cents: 34_999,
            category: computers,
            item_type: computing,
        },
        SeedItem {
            barcode: "TEC-008",
            name: "Set de Herramientas Electrónicas",
            description: "Kit completo de herramientas para electrónica",
            quantity: 6,
            cost_cents: 12_999,
            category: electronics,
            item_type: tools,
        },
    ];

    let mut ids = Vec::with_capacity(seed_items.len());
    for seed in seed_items {
        let view = desk.register_item(
            &admin,
            NewItem {
                barcode: seed.barcode.into(),
                name: seed.name.into(),
                description: seed.description.into(),
                quantity_on_hand: seed.quantity,
                cost_cents: seed.cost_cents,
                image_ref: None,
                classification: ItemClassification::new(seed.category, seed.item_type, location),
            },
        )?;
        ids.push(view.item.id_typed());
    }

    // The microscope is out for repair.
    desk.update_item(
        &admin,
        ids[4],
        ItemPatch {
            state: Some(repair_state),
            ..ItemPatch::default()
        },
    )?;

    let now = desk.now();
    desk.request_loan(
        &admin,
        LoanForm::new(
            ids[2],
            Requester::new("Carlos Méndez", "0912345678", RequesterRole::Student)
                .with_email("cmendez@universidad.edu"),
        )
        .details(LoanDetails {
            purpose: Some("Proyecto de robótica".into()),
            destination: Some("Laboratorio de Electrónica".into()),
            ..LoanDetails::default()
        }),
    )?;
    desk.request_loan(
        &admin,
        LoanForm::new(ids[5], Requester::new("Ana Gómez", "0923456789", RequesterRole::Teacher))
            .window(now, now + Duration::days(14))
            .details(LoanDetails {
                event: Some("Feria de ciencias".into()),
                ..LoanDetails::default()
            }),
    )?;

    desk.sanction(
        &admin,
        NewDenyListEntry {
            full_name: "Juan Pérez".into(),
            national_id: Some("123456789".into()),
            reason: "Equipo devuelto con daños".into(),
            incident_date: now - Duration::days(30),
            sanction: SanctionTerm::Until(now + Duration::days(60)),
        },
    )?;

    Ok(desk)
}
