mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use stockroom_core::{AuditEvent, CategoryId, DomainError, PageRequest};
use stockroom_inventory::{NewProduct, NewWarehouse, ProductChanges, ProductFilter, WarehouseChanges};

use common::{Harness, t0};

#[tokio::test]
async fn staff_cannot_touch_master_data() {
    let h = Harness::new();
    let err = h
        .inventory
        .create_warehouse(
            &h.staff,
            NewWarehouse {
                code: "WH-02".to_string(),
                name: "Overflow".to_string(),
                address: String::new(),
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::Forbidden(_));
}

#[tokio::test]
async fn product_requires_existing_category_and_shelf() {
    let h = Harness::new();
    let existing = h.product("Template", 1, dec!(1.00)).await;

    let err = h
        .inventory
        .create_product(
            &h.admin,
            NewProduct {
                category_id: CategoryId::new(),
                shelf_id: existing.shelf_id,
                name: "Orphan".to_string(),
                description: String::new(),
                unit_price: dec!(1.00),
                cost_price: dec!(0.50),
                stock_quantity: 1,
                min_stock_level: 0,
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::not_found("category"));
}

#[tokio::test]
async fn zero_min_stock_defaults_and_prices_are_normalized() {
    let h = Harness::new();
    let template = h.product("Template", 1, dec!(1.00)).await;
    let product = h
        .inventory
        .create_product(
            &h.admin,
            NewProduct {
                category_id: template.category_id,
                shelf_id: template.shelf_id,
                name: "Hinge".to_string(),
                description: String::new(),
                unit_price: dec!(3.5),
                cost_price: dec!(1.999),
                stock_quantity: 9,
                min_stock_level: 0,
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(product.min_stock_level, 5);
    assert_eq!(product.unit_price.to_string(), "3.50");
    assert_eq!(product.cost_price.to_string(), "2.00");
}

#[tokio::test]
async fn catalogue_updates_never_change_stock() {
    let h = Harness::new();
    let p = h.product("Bolt", 40, dec!(0.20)).await;
    let updated = h
        .inventory
        .update_product(
            &h.admin,
            p.id,
            ProductChanges {
                name: Some("Hex bolt".to_string()),
                unit_price: Some(dec!(0.25)),
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Hex bolt");
    assert_eq!(h.stock_of(&p).await, 40);
}

#[tokio::test]
async fn update_stock_sets_absolute_quantity_and_audits() {
    let h = Harness::new();
    let p = h.product("Washer", 3, dec!(0.05)).await;

    let change = h
        .inventory
        .update_stock(&h.staff, p.id, 120, Some("delivery".to_string()), t0())
        .await
        .unwrap();
    assert_eq!((change.old_stock, change.new_stock), (3, 120));
    assert_eq!(h.stock_of(&p).await, 120);

    assert_matches!(
        h.audit.events().last(),
        Some(AuditEvent::StockSet { change: 117, notes: Some(n), .. }) if n == "delivery"
    );

    assert_matches!(
        h.inventory.update_stock(&h.staff, p.id, -1, None, t0()).await,
        Err(DomainError::InvalidRequest(_))
    );
}

#[tokio::test]
async fn low_stock_listing_excludes_empty_products() {
    let h = Harness::new();
    h.product("Healthy", 50, dec!(1.00)).await;
    let low = h.product("Nearly out", 1, dec!(1.00)).await;
    let lower = h.product("Running low", 2, dec!(1.00)).await;
    h.product("Empty", 0, dec!(1.00)).await;

    let page = h.inventory.list_low_stock(PageRequest::default()).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![low.id, lower.id]);
    assert!(page.items.iter().all(|p| p.is_low_stock()));
}

#[tokio::test]
async fn listing_filters_by_warehouse_and_hides_deleted() {
    let h = Harness::new();
    let a = h.product("In A", 5, dec!(1.00)).await;
    let b = h.product("In B", 5, dec!(1.00)).await;
    let shelf = h.inventory.get_shelf(a.shelf_id).await.unwrap();

    let in_a = h
        .inventory
        .list_products(
            ProductFilter {
                warehouse_id: Some(shelf.warehouse_id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(in_a.items.len(), 1);
    assert_eq!(in_a.items[0].id, a.id);

    h.inventory.delete_product(&h.admin, b.id, t0()).await.unwrap();
    let all = h
        .inventory
        .list_products(ProductFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 1);
    assert_matches!(
        h.inventory.get_product(b.id).await,
        Err(DomainError::NotFound(_))
    );
    assert_matches!(
        h.inventory.delete_product(&h.admin, b.id, t0()).await,
        Err(DomainError::NotFound(_))
    );
}

#[tokio::test]
async fn warehouse_edit_and_validation() {
    let h = Harness::new();
    let p = h.product("Anything", 1, dec!(1.00)).await;
    let shelf = h.inventory.get_shelf(p.shelf_id).await.unwrap();

    let renamed = h
        .inventory
        .update_warehouse(
            &h.admin,
            shelf.warehouse_id,
            WarehouseChanges {
                name: Some("North depot".to_string()),
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "North depot");

    assert_matches!(
        h.inventory
            .update_warehouse(
                &h.admin,
                shelf.warehouse_id,
                WarehouseChanges {
                    code: Some("X".to_string()),
                    ..Default::default()
                },
                t0(),
            )
            .await,
        Err(DomainError::InvalidRequest(_))
    );
}

#[tokio::test]
async fn warehouse_codes_are_unique_among_live_rows() {
    let h = Harness::new();
    let new = || NewWarehouse {
        code: "DUP-1".to_string(),
        name: "Duplicate".to_string(),
        address: String::new(),
    };
    let first = h.inventory.create_warehouse(&h.admin, new(), t0()).await.unwrap();
    assert_matches!(
        h.inventory.create_warehouse(&h.admin, new(), t0()).await,
        Err(DomainError::Conflict(_))
    );

    h.inventory.delete_warehouse(&h.admin, first.id, t0()).await.unwrap();
    h.inventory.create_warehouse(&h.admin, new(), t0()).await.unwrap();
}
