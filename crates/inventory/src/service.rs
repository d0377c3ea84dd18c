//! Catalogue operations with authorization, validation and referential checks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use stockroom_auth::{Permission, Principal, authorize};
use stockroom_core::{
    AuditEvent, AuditSink, CategoryId, DomainError, DomainResult, PageRequest, Paged, ProductId,
    ShelfId, WarehouseId,
};

use crate::{
    CatalogStore, Category, CategoryChanges, NewCategory, NewProduct, NewShelf, NewWarehouse,
    Product, ProductChanges, ProductFilter, Shelf, ShelfChanges, StockChange, Warehouse,
    WarehouseChanges,
};

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn CatalogStore>,
    audit: Arc<dyn AuditSink>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn CatalogStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    // -------------------------
    // Warehouses
    // -------------------------

    pub async fn create_warehouse(
        &self,
        actor: &Principal,
        new: NewWarehouse,
        now: DateTime<Utc>,
    ) -> DomainResult<Warehouse> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        new.validate()?;
        let warehouse = new.into_warehouse(now);
        self.store.insert_warehouse(&warehouse).await?;
        Ok(warehouse)
    }

    pub async fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Warehouse> {
        self.store
            .get_warehouse(id)
            .await?
            .ok_or_else(|| DomainError::not_found("warehouse"))
    }

    pub async fn list_warehouses(&self, page: PageRequest) -> DomainResult<Paged<Warehouse>> {
        let (items, total) = self.store.list_warehouses(page).await?;
        Ok(Paged::new(items, page, total))
    }

    pub async fn update_warehouse(
        &self,
        actor: &Principal,
        id: WarehouseId,
        changes: WarehouseChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Warehouse> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        changes.validate()?;
        let mut warehouse = self.get_warehouse(id).await?;
        warehouse.apply(changes, now);
        self.store.update_warehouse(&warehouse).await?;
        Ok(warehouse)
    }

    pub async fn delete_warehouse(
        &self,
        actor: &Principal,
        id: WarehouseId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        if !self.store.soft_delete_warehouse(id, now).await? {
            return Err(DomainError::not_found("warehouse"));
        }
        Ok(())
    }

    // -------------------------
    // Shelves
    // -------------------------

    pub async fn create_shelf(
        &self,
        actor: &Principal,
        new: NewShelf,
        now: DateTime<Utc>,
    ) -> DomainResult<Shelf> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        new.validate()?;
        self.get_warehouse(new.warehouse_id).await?;
        let shelf = new.into_shelf(now);
        self.store.insert_shelf(&shelf).await?;
        Ok(shelf)
    }

    pub async fn get_shelf(&self, id: ShelfId) -> DomainResult<Shelf> {
        self.store
            .get_shelf(id)
            .await?
            .ok_or_else(|| DomainError::not_found("shelf"))
    }

    pub async fn list_shelves(
        &self,
        warehouse_id: Option<WarehouseId>,
        page: PageRequest,
    ) -> DomainResult<Paged<Shelf>> {
        if let Some(warehouse_id) = warehouse_id {
            self.get_warehouse(warehouse_id).await?;
        }
        let (items, total) = self.store.list_shelves(warehouse_id, page).await?;
        Ok(Paged::new(items, page, total))
    }

    pub async fn update_shelf(
        &self,
        actor: &Principal,
        id: ShelfId,
        changes: ShelfChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Shelf> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        changes.validate()?;
        if let Some(warehouse_id) = changes.warehouse_id {
            self.get_warehouse(warehouse_id).await?;
        }
        let mut shelf = self.get_shelf(id).await?;
        shelf.apply(changes, now);
        self.store.update_shelf(&shelf).await?;
        Ok(shelf)
    }

    pub async fn delete_shelf(
        &self,
        actor: &Principal,
        id: ShelfId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        if !self.store.soft_delete_shelf(id, now).await? {
            return Err(DomainError::not_found("shelf"));
        }
        Ok(())
    }

    // -------------------------
    // Categories
    // -------------------------

    pub async fn create_category(
        &self,
        actor: &Principal,
        new: NewCategory,
        now: DateTime<Utc>,
    ) -> DomainResult<Category> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        new.validate()?;
        let category = new.into_category(now);
        self.store.insert_category(&category).await?;
        Ok(category)
    }

    pub async fn get_category(&self, id: CategoryId) -> DomainResult<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category"))
    }

    pub async fn list_categories(&self, page: PageRequest) -> DomainResult<Paged<Category>> {
        let (items, total) = self.store.list_categories(page).await?;
        Ok(Paged::new(items, page, total))
    }

    pub async fn update_category(
        &self,
        actor: &Principal,
        id: CategoryId,
        changes: CategoryChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Category> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        changes.validate()?;
        let mut category = self.get_category(id).await?;
        category.apply(changes, now);
        self.store.update_category(&category).await?;
        Ok(category)
    }

    pub async fn delete_category(
        &self,
        actor: &Principal,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        if !self.store.soft_delete_category(id, now).await? {
            return Err(DomainError::not_found("category"));
        }
        Ok(())
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn create_product(
        &self,
        actor: &Principal,
        new: NewProduct,
        now: DateTime<Utc>,
    ) -> DomainResult<Product> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        new.validate()?;
        self.get_category(new.category_id).await?;
        self.get_shelf(new.shelf_id).await?;

        let product = new.into_product(now);
        self.store.insert_product(&product).await?;
        info!(product_id = %product.id, stock = product.stock_quantity, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))
    }

    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> DomainResult<Paged<Product>> {
        let (items, total) = self.store.list_products(filter, page).await?;
        Ok(Paged::new(items, page, total))
    }

    pub async fn list_products_by_category(
        &self,
        category_id: CategoryId,
        page: PageRequest,
    ) -> DomainResult<Paged<Product>> {
        self.get_category(category_id).await?;
        let filter = ProductFilter {
            category_id: Some(category_id),
            ..Default::default()
        };
        self.list_products(filter, page).await
    }

    pub async fn list_products_by_shelf(
        &self,
        shelf_id: ShelfId,
        page: PageRequest,
    ) -> DomainResult<Paged<Product>> {
        self.get_shelf(shelf_id).await?;
        let filter = ProductFilter {
            shelf_id: Some(shelf_id),
            ..Default::default()
        };
        self.list_products(filter, page).await
    }

    pub async fn list_low_stock(&self, page: PageRequest) -> DomainResult<Paged<Product>> {
        let (items, total) = self.store.list_low_stock_products(page).await?;
        Ok(Paged::new(items, page, total))
    }

    pub async fn update_product(
        &self,
        actor: &Principal,
        id: ProductId,
        changes: ProductChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Product> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        changes.validate()?;
        if let Some(category_id) = changes.category_id {
            self.get_category(category_id).await?;
        }
        if let Some(shelf_id) = changes.shelf_id {
            self.get_shelf(shelf_id).await?;
        }
        let mut product = self.get_product(id).await?;
        product.apply(changes, now);
        self.store.update_product(&product).await?;
        Ok(product)
    }

    pub async fn delete_product(
        &self,
        actor: &Principal,
        id: ProductId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        authorize(actor, &Permission::MASTER_DATA_MANAGE)?;
        if !self.store.soft_delete_product(id, now).await? {
            return Err(DomainError::not_found("product"));
        }
        Ok(())
    }

    /// Set the absolute on-hand quantity (restock or stock-take correction).
    #[instrument(skip(self, notes), fields(actor = %actor.user_id), err)]
    pub async fn update_stock(
        &self,
        actor: &Principal,
        id: ProductId,
        quantity: i32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<StockChange> {
        authorize(actor, &Permission::STOCK_UPDATE)?;
        if quantity < 0 {
            return Err(DomainError::invalid("quantity must be >= 0"));
        }

        let change = self.store.set_stock(id, quantity, now).await?;
        self.audit.record(AuditEvent::StockSet {
            product_id: id,
            user_id: actor.user_id,
            old_stock: change.old_stock,
            new_stock: change.new_stock,
            change: change.change(),
            notes,
        });
        Ok(change)
    }
}
