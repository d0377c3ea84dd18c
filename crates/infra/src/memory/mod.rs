//! In-memory store.
//!
//! Every table lives behind one async mutex. A unit of work takes the lock for
//! its whole lifetime and edits a staged copy, which replaces the live tables
//! on commit and is dropped on rollback. Intended for tests and local runs.

mod accounts;
mod catalog;
mod reports;
mod sales;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use stockroom_auth::{Session, SessionToken, User};
use stockroom_core::{
    CategoryId, Entity, PageRequest, ProductId, SaleId, ShelfId, UserId, WarehouseId,
};
use stockroom_inventory::{Category, Product, Shelf, Warehouse};
use stockroom_sales::Sale;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionToken, Session>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    shelves: HashMap<ShelfId, Shelf>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    sales: HashMap<SaleId, Sale>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort newest first and cut out one page, returning the total too.
fn paginate<E>(mut rows: Vec<E>, page: PageRequest) -> (Vec<E>, u64)
where
    E: Entity + Clone,
    E::Id: Ord,
{
    rows.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    let total = rows.len() as u64;
    (page.slice(&rows), total)
}
