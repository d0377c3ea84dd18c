//! Catalogue persistence port (master data + product rows).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{
    CategoryId, DomainResult, PageRequest, ProductId, ShelfId, WarehouseId,
};

use crate::{Category, Product, ProductFilter, Shelf, StockChange, Warehouse};

/// Plain CRUD over the catalogue. Reads exclude soft-deleted rows; listings
/// are newest first and return `(page, total)`.
///
/// Uniqueness violations surface as `Conflict`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> DomainResult<()>;
    async fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>>;
    async fn update_warehouse(&self, warehouse: &Warehouse) -> DomainResult<()>;
    async fn list_warehouses(&self, page: PageRequest) -> DomainResult<(Vec<Warehouse>, u64)>;
    async fn soft_delete_warehouse(&self, id: WarehouseId, at: DateTime<Utc>) -> DomainResult<bool>;

    async fn insert_shelf(&self, shelf: &Shelf) -> DomainResult<()>;
    async fn get_shelf(&self, id: ShelfId) -> DomainResult<Option<Shelf>>;
    async fn update_shelf(&self, shelf: &Shelf) -> DomainResult<()>;
    async fn list_shelves(
        &self,
        warehouse_id: Option<WarehouseId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Shelf>, u64)>;
    async fn soft_delete_shelf(&self, id: ShelfId, at: DateTime<Utc>) -> DomainResult<bool>;

    async fn insert_category(&self, category: &Category) -> DomainResult<()>;
    async fn get_category(&self, id: CategoryId) -> DomainResult<Option<Category>>;
    async fn update_category(&self, category: &Category) -> DomainResult<()>;
    async fn list_categories(&self, page: PageRequest) -> DomainResult<(Vec<Category>, u64)>;
    async fn soft_delete_category(&self, id: CategoryId, at: DateTime<Utc>) -> DomainResult<bool>;

    async fn insert_product(&self, product: &Product) -> DomainResult<()>;
    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>>;
    /// Writes catalogue fields only; `stock_quantity` is left untouched.
    async fn update_product(&self, product: &Product) -> DomainResult<()>;
    async fn list_products(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> DomainResult<(Vec<Product>, u64)>;
    /// Products with `0 < stock <= min_stock_level`, lowest stock first.
    async fn list_low_stock_products(&self, page: PageRequest) -> DomainResult<(Vec<Product>, u64)>;
    async fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> DomainResult<bool>;

    /// Overwrite the on-hand quantity atomically, returning old and new.
    async fn set_stock(
        &self,
        id: ProductId,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<StockChange>;
}
