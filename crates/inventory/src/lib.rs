//! Inventory domain: warehouses, shelves, categories, products and stock.
//!
//! Pure rules live on the entity types; storage is reached through the
//! `CatalogStore` port (plain CRUD) and the `StockLedger` port (stock
//! mutations inside a unit of work).

pub mod category;
pub mod ledger;
pub mod product;
mod rules;
pub mod service;
pub mod shelf;
pub mod store;
pub mod warehouse;

pub use category::{Category, CategoryChanges, NewCategory};
pub use ledger::{StockChange, StockLedger, StockReservation};
pub use product::{DEFAULT_MIN_STOCK_LEVEL, NewProduct, Product, ProductChanges, ProductFilter};
pub use service::InventoryService;
pub use shelf::{NewShelf, Shelf, ShelfChanges};
pub use store::CatalogStore;
pub use warehouse::{NewWarehouse, Warehouse, WarehouseChanges};
