mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stockroom_core::{AuditEvent, DomainError, PageRequest};
use stockroom_inventory::{CatalogStore, ProductChanges};
use stockroom_sales::{SaleLine, SaleStatus};

use common::{Harness, t0};

fn line(product: &stockroom_inventory::Product, quantity: i32) -> SaleLine {
    SaleLine {
        product_id: product.id,
        quantity,
    }
}

#[tokio::test]
async fn sale_deducts_stock_and_rejects_oversell() {
    let h = Harness::new();
    let p = h.product("Claw hammer", 10, dec!(5.00)).await;

    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 3)], t0())
        .await
        .unwrap();
    assert_eq!(sale.total_amount, dec!(15.00));
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].unit_price, dec!(5.00));
    assert_eq!(h.stock_of(&p).await, 7);

    let err = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 8)], t0())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        DomainError::InsufficientStock { requested: 8, available: 7, .. }
    );
    assert_eq!(h.stock_of(&p).await, 7);

    let listed = h.sales.list_sales(None, PageRequest::default()).await.unwrap();
    assert_eq!(listed.meta.total, 1);
}

#[tokio::test]
async fn failing_line_rolls_back_every_line() {
    let h = Harness::new();
    let plenty = h.product("Box of nails", 10, dec!(2.50)).await;
    let scarce = h.product("Spirit level", 1, dec!(20.00)).await;

    let err = h
        .sales
        .create_sale(
            h.staff.user_id,
            vec![line(&plenty, 4), line(&scarce, 2)],
            t0(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::InsufficientStock { product_id, .. } if product_id == scarce.id);

    assert_eq!(h.stock_of(&plenty).await, 10);
    assert_eq!(h.stock_of(&scarce).await, 1);
    let listed = h.sales.list_sales(None, PageRequest::default()).await.unwrap();
    assert_eq!(listed.meta.total, 0);
    assert!(h.audit.events().is_empty());
}

#[tokio::test]
async fn items_keep_request_order_and_totals_add_up() {
    let h = Harness::new();
    let a = h.product("Wood screws", 50, dec!(0.35)).await;
    let b = h.product("Wall plugs", 50, dec!(0.10)).await;
    let c = h.product("Drill bit", 50, dec!(4.99)).await;

    let sale = h
        .sales
        .create_sale(
            h.staff.user_id,
            vec![line(&c, 1), line(&a, 12), line(&b, 7)],
            t0(),
        )
        .await
        .unwrap();

    let order: Vec<_> = sale.items.iter().map(|i| i.product_id).collect();
    assert_eq!(order, vec![c.id, a.id, b.id]);
    assert_eq!(sale.total_amount, dec!(4.99) + dec!(4.20) + dec!(0.70));
    assert_eq!(sale.total_amount, sale.items_total());
}

#[tokio::test]
async fn unstorable_prices_are_rejected_up_front() {
    let h = Harness::new();
    let p = h.product("Gold-plated anvil", 10, dec!(5.00)).await;

    let err = h
        .inventory
        .update_product(
            &h.admin,
            p.id,
            ProductChanges {
                unit_price: Some(Decimal::MAX / dec!(2)),
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::InvalidRequest(_));
    assert_eq!(h.inventory.get_product(p.id).await.unwrap().unit_price, dec!(5.00));
}

#[tokio::test]
async fn oversized_sale_total_is_invalid_and_rolled_back() {
    let h = Harness::new();
    let p = h.product("Cargo ship", 20_000, dec!(9999999999.99)).await;

    let err = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 20_000)], t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::InvalidRequest(_));
    assert_eq!(h.stock_of(&p).await, 20_000);

    let listed = h.sales.list_sales(None, PageRequest::default()).await.unwrap();
    assert_eq!(listed.meta.total, 0);

    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 3)], t0())
        .await
        .unwrap();
    assert_eq!(sale.total_amount, dec!(29999999999.97));
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let h = Harness::new();
    let p = h.product("Tape measure", 5, dec!(7.00)).await;
    h.inventory.delete_product(&h.admin, p.id, t0()).await.unwrap();

    let err = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 1)], t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::NotFound(_));
}

#[tokio::test]
async fn cancelling_restores_stock() {
    let h = Harness::new();
    let p = h.product("Paint roller", 10, dec!(5.00)).await;
    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 4)], t0())
        .await
        .unwrap();
    assert_eq!(h.stock_of(&p).await, 6);

    let later = t0() + Duration::minutes(5);
    let cancelled = h
        .sales
        .update_sale_status(sale.id, "cancelled", h.admin.user_id, later)
        .await
        .unwrap();
    assert_eq!(cancelled.status, SaleStatus::Cancelled);
    assert_eq!(h.stock_of(&p).await, 10);

    let reloaded = h.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(reloaded.status, SaleStatus::Cancelled);
    assert_eq!(reloaded.updated_at, later);

    let names = h.audit.names();
    assert!(names.contains(&"sale_status_changed"));
    assert!(names.contains(&"stock_restored"));
}

#[tokio::test]
async fn cancelling_returns_stock_to_soft_deleted_products() {
    let h = Harness::new();
    let p = h.product("Discontinued saw", 3, dec!(12.00)).await;
    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 2)], t0())
        .await
        .unwrap();
    h.inventory.delete_product(&h.admin, p.id, t0()).await.unwrap();

    h.sales
        .update_sale_status(sale.id, "cancelled", h.admin.user_id, t0())
        .await
        .unwrap();

    // Hidden from reads but the row still carries the returned units.
    assert!(h.store.get_product(p.id).await.unwrap().is_none());
    let (rows, _) = h
        .store
        .list_products(Default::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(rows.iter().all(|r| r.id != p.id));
    let restored = h.audit.events().into_iter().find_map(|e| match e {
        AuditEvent::StockRestored { old_stock, new_stock, .. } => Some((old_stock, new_stock)),
        _ => None,
    });
    assert_eq!(restored, Some((1, 3)));
    assert!(!h.audit.names().contains(&"stock_restore_skipped"));
}

#[tokio::test]
async fn other_transitions_are_plain_status_writes() {
    let h = Harness::new();
    let p = h.product("Sandpaper", 10, dec!(1.00)).await;
    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 2)], t0())
        .await
        .unwrap();

    h.sales
        .update_sale_status(sale.id, "cancelled", h.admin.user_id, t0())
        .await
        .unwrap();
    assert_eq!(h.stock_of(&p).await, 10);

    // Re-completing does not deduct again, and a second cancel does nothing.
    let s = h
        .sales
        .update_sale_status(sale.id, "completed", h.admin.user_id, t0())
        .await
        .unwrap();
    assert_eq!(s.status, SaleStatus::Completed);
    assert_eq!(h.stock_of(&p).await, 10);

    h.sales
        .update_sale_status(sale.id, "pending", h.admin.user_id, t0())
        .await
        .unwrap();
    h.sales
        .update_sale_status(sale.id, "cancelled", h.admin.user_id, t0())
        .await
        .unwrap();
    assert_eq!(h.stock_of(&p).await, 10);
}

#[tokio::test]
async fn bad_status_and_missing_sale() {
    let h = Harness::new();
    let p = h.product("Pliers", 10, dec!(6.00)).await;
    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 1)], t0())
        .await
        .unwrap();

    let err = h
        .sales
        .update_sale_status(sale.id, "refunded", h.admin.user_id, t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::InvalidRequest(_));

    let err = h
        .sales
        .update_sale_status(stockroom_core::SaleId::new(), "cancelled", h.admin.user_id, t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::NotFound(_));
}

#[tokio::test]
async fn get_sale_is_stable_between_reads() {
    let h = Harness::new();
    let p = h.product("Chisel", 10, dec!(9.50)).await;
    let sale = h
        .sales
        .create_sale(h.staff.user_id, vec![line(&p, 2)], t0())
        .await
        .unwrap();

    let first = h.sales.get_sale(sale.id).await.unwrap();
    let second = h.sales.get_sale(sale.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, sale);
}

#[tokio::test]
async fn staff_only_see_their_own_sales() {
    let h = Harness::new();
    let p = h.product("Wrench", 20, dec!(8.00)).await;
    let mine = h
        .sales
        .create_sale_for(&h.staff, vec![line(&p, 1)], t0())
        .await
        .unwrap();
    let theirs = h
        .sales
        .create_sale_for(&h.admin, vec![line(&p, 1)], t0())
        .await
        .unwrap();

    let page = h.sales.list_sales_for(&h.staff, PageRequest::default()).await.unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.items[0].id, mine.id);

    let all = h.sales.list_sales_for(&h.admin, PageRequest::default()).await.unwrap();
    assert_eq!(all.meta.total, 2);

    let err = h.sales.get_sale_for(&h.staff, theirs.id).await.unwrap_err();
    assert_matches!(err, DomainError::Forbidden(_));
    let err = h
        .sales
        .update_sale_status_for(&h.staff, theirs.id, "cancelled", t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::Forbidden(_));
    let untouched = h.sales.get_sale(theirs.id).await.unwrap();
    assert_eq!(untouched.status, SaleStatus::Completed);
    assert_eq!(h.stock_of(&p).await, 18);
}

#[tokio::test]
async fn page_limits() {
    assert!(PageRequest::new(Some(1), Some(100)).is_ok());
    assert_matches!(
        PageRequest::new(Some(1), Some(101)),
        Err(DomainError::InvalidRequest(_))
    );

    let h = Harness::new();
    let p = h.product("Level", 50, dec!(3.00)).await;
    for _ in 0..3 {
        h.sales
            .create_sale(h.staff.user_id, vec![line(&p, 1)], t0())
            .await
            .unwrap();
    }
    let page = h
        .sales
        .list_sales(None, PageRequest::new(Some(2), Some(2)).unwrap())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let h = Arc::new(Harness::new());
    let p = h.product("Last few widgets", 5, dec!(1.00)).await;

    let mut tasks = Vec::new();
    for _ in 0..12 {
        let h = h.clone();
        let product_id = p.id;
        tasks.push(tokio::spawn(async move {
            h.sales
                .create_sale(
                    h.staff.user_id,
                    vec![SaleLine {
                        product_id,
                        quantity: 1,
                    }],
                    t0(),
                )
                .await
        }));
    }

    let mut ok = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => ok += 1,
            Err(DomainError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(rejected, 7);
    assert_eq!(h.stock_of(&p).await, 0);
}
