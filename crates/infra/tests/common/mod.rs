#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use stockroom_auth::{AuthService, Principal, Role, UserService};
use stockroom_core::{AuditEvent, AuditSink, UserId};
use stockroom_infra::InMemoryStore;
use stockroom_inventory::{
    InventoryService, NewCategory, NewProduct, NewShelf, NewWarehouse, Product,
};
use stockroom_reports::ReportingAggregator;
use stockroom_sales::{SaleWorkflow, SequentialInvoiceNumbers};

#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(AuditEvent::name).collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub audit: Arc<RecordingAudit>,
    pub inventory: InventoryService,
    pub sales: SaleWorkflow,
    pub reports: ReportingAggregator,
    pub auth: AuthService,
    pub users: UserService,
    pub admin: Principal,
    pub staff: Principal,
    seq: AtomicU32,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(RecordingAudit::default());
        Self {
            inventory: InventoryService::new(store.clone(), audit.clone()),
            sales: SaleWorkflow::new(
                store.clone(),
                Arc::new(SequentialInvoiceNumbers::starting_at(1)),
                audit.clone(),
            ),
            reports: ReportingAggregator::new(store.clone()),
            auth: AuthService::new(store.clone(), store.clone(), Duration::hours(24)),
            users: UserService::new(store.clone(), store.clone()),
            admin: Principal::new(UserId::new(), Role::Admin),
            staff: Principal::new(UserId::new(), Role::Staff),
            store,
            audit,
            seq: AtomicU32::new(1),
        }
    }

    /// Create a warehouse, shelf and category and a product on them.
    pub async fn product(&self, name: &str, stock: i32, unit_price: Decimal) -> Product {
        let now = t0();
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let warehouse = self
            .inventory
            .create_warehouse(
                &self.admin,
                NewWarehouse {
                    code: format!("WH-{n:03}"),
                    name: "Main warehouse".to_string(),
                    address: String::new(),
                },
                now,
            )
            .await
            .unwrap();
        let shelf = self
            .inventory
            .create_shelf(
                &self.admin,
                NewShelf {
                    warehouse_id: warehouse.id,
                    code: "A-01".to_string(),
                    name: "Aisle one".to_string(),
                },
                now,
            )
            .await
            .unwrap();
        let category = self
            .inventory
            .create_category(
                &self.admin,
                NewCategory {
                    name: "Hardware".to_string(),
                    description: String::new(),
                },
                now,
            )
            .await
            .unwrap();
        self.inventory
            .create_product(
                &self.admin,
                NewProduct {
                    category_id: category.id,
                    shelf_id: shelf.id,
                    name: name.to_string(),
                    description: String::new(),
                    unit_price,
                    cost_price: unit_price / Decimal::from(2),
                    stock_quantity: stock,
                    min_stock_level: 2,
                },
                now,
            )
            .await
            .unwrap()
    }

    pub async fn stock_of(&self, product: &Product) -> i32 {
        self.inventory
            .get_product(product.id)
            .await
            .unwrap()
            .stock_quantity
    }
}

/// 2024-01-15 10:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}
