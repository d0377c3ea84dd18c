use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{
    CategoryId, DomainError, DomainResult, PageRequest, ProductId, ShelfId, SoftDelete,
    WarehouseId,
};
use stockroom_inventory::{
    CatalogStore, Category, Product, ProductFilter, Shelf, StockChange, Warehouse,
};

use super::{InMemoryStore, Tables, paginate};

/// Shared body of the soft-delete methods.
fn soft_delete<K, V>(
    rows: &mut std::collections::HashMap<K, V>,
    id: &K,
    at: DateTime<Utc>,
) -> bool
where
    K: Eq + std::hash::Hash,
    V: SoftDelete,
{
    match rows.get_mut(id).filter(|r| !r.is_deleted()) {
        Some(row) => {
            row.mark_deleted(at);
            true
        }
        None => false,
    }
}

const WAREHOUSE_CODE_TAKEN: &str = "warehouse code already exists";

impl Tables {
    /// Another live warehouse already uses this code.
    fn warehouse_code_taken(&self, warehouse: &Warehouse) -> bool {
        self.warehouses
            .values()
            .any(|w| w.id != warehouse.id && !w.is_deleted() && w.code == warehouse.code)
    }

    /// Category/shelf via `ProductFilter::matches`, warehouse via the shelf row.
    pub(super) fn product_matches(&self, filter: &ProductFilter, product: &Product) -> bool {
        if product.is_deleted() || !filter.matches(product) {
            return false;
        }
        match filter.warehouse_id {
            None => true,
            Some(wh) => self
                .shelves
                .get(&product.shelf_id)
                .is_some_and(|s| s.warehouse_id == wh),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.warehouses.contains_key(&warehouse.id) || t.warehouse_code_taken(warehouse) {
            return Err(DomainError::conflict(WAREHOUSE_CODE_TAKEN));
        }
        t.warehouses.insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>> {
        let t = self.tables.lock().await;
        Ok(t.warehouses.get(&id).filter(|w| !w.is_deleted()).cloned())
    }

    async fn update_warehouse(&self, warehouse: &Warehouse) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.warehouse_code_taken(warehouse) {
            return Err(DomainError::conflict(WAREHOUSE_CODE_TAKEN));
        }
        let row = t
            .warehouses
            .get_mut(&warehouse.id)
            .filter(|w| !w.is_deleted())
            .ok_or_else(|| DomainError::not_found("warehouse"))?;
        *row = warehouse.clone();
        Ok(())
    }

    async fn list_warehouses(&self, page: PageRequest) -> DomainResult<(Vec<Warehouse>, u64)> {
        let t = self.tables.lock().await;
        let rows = t.warehouses.values().filter(|w| !w.is_deleted()).cloned().collect();
        Ok(paginate(rows, page))
    }

    async fn soft_delete_warehouse(&self, id: WarehouseId, at: DateTime<Utc>) -> DomainResult<bool> {
        Ok(soft_delete(&mut self.tables.lock().await.warehouses, &id, at))
    }

    async fn insert_shelf(&self, shelf: &Shelf) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.shelves.contains_key(&shelf.id) {
            return Err(DomainError::conflict("shelf already exists"));
        }
        t.shelves.insert(shelf.id, shelf.clone());
        Ok(())
    }

    async fn get_shelf(&self, id: ShelfId) -> DomainResult<Option<Shelf>> {
        let t = self.tables.lock().await;
        Ok(t.shelves.get(&id).filter(|s| !s.is_deleted()).cloned())
    }

    async fn update_shelf(&self, shelf: &Shelf) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .shelves
            .get_mut(&shelf.id)
            .filter(|s| !s.is_deleted())
            .ok_or_else(|| DomainError::not_found("shelf"))?;
        *row = shelf.clone();
        Ok(())
    }

    async fn list_shelves(
        &self,
        warehouse_id: Option<WarehouseId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Shelf>, u64)> {
        let t = self.tables.lock().await;
        let rows = t
            .shelves
            .values()
            .filter(|s| !s.is_deleted())
            .filter(|s| warehouse_id.is_none_or(|wh| s.warehouse_id == wh))
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn soft_delete_shelf(&self, id: ShelfId, at: DateTime<Utc>) -> DomainResult<bool> {
        Ok(soft_delete(&mut self.tables.lock().await.shelves, &id, at))
    }

    async fn insert_category(&self, category: &Category) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.categories.contains_key(&category.id) {
            return Err(DomainError::conflict("category already exists"));
        }
        t.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        let t = self.tables.lock().await;
        Ok(t.categories.get(&id).filter(|c| !c.is_deleted()).cloned())
    }

    async fn update_category(&self, category: &Category) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .categories
            .get_mut(&category.id)
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| DomainError::not_found("category"))?;
        *row = category.clone();
        Ok(())
    }

    async fn list_categories(&self, page: PageRequest) -> DomainResult<(Vec<Category>, u64)> {
        let t = self.tables.lock().await;
        let rows = t.categories.values().filter(|c| !c.is_deleted()).cloned().collect();
        Ok(paginate(rows, page))
    }

    async fn soft_delete_category(&self, id: CategoryId, at: DateTime<Utc>) -> DomainResult<bool> {
        Ok(soft_delete(&mut self.tables.lock().await.categories, &id, at))
    }

    async fn insert_product(&self, product: &Product) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.products.contains_key(&product.id) {
            return Err(DomainError::conflict("product already exists"));
        }
        t.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let t = self.tables.lock().await;
        Ok(t.products.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn update_product(&self, product: &Product) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        let row = t
            .products
            .get_mut(&product.id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| DomainError::not_found("product"))?;
        let stock = row.stock_quantity;
        *row = product.clone();
        row.stock_quantity = stock;
        Ok(())
    }

    async fn list_products(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> DomainResult<(Vec<Product>, u64)> {
        let t = self.tables.lock().await;
        let rows = t
            .products
            .values()
            .filter(|p| t.product_matches(&filter, p))
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn list_low_stock_products(&self, page: PageRequest) -> DomainResult<(Vec<Product>, u64)> {
        let t = self.tables.lock().await;
        let mut rows: Vec<Product> = t
            .products
            .values()
            .filter(|p| !p.is_deleted() && p.needs_restock())
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.stock_quantity
                .cmp(&b.stock_quantity)
                .then_with(|| a.name.cmp(&b.name))
        });
        let total = rows.len() as u64;
        Ok((page.slice(&rows), total))
    }

    async fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> DomainResult<bool> {
        Ok(soft_delete(&mut self.tables.lock().await.products, &id, at))
    }

    async fn set_stock(
        &self,
        id: ProductId,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<StockChange> {
        let mut t = self.tables.lock().await;
        let product = t
            .products
            .get_mut(&id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| DomainError::not_found("product"))?;
        let old_stock = product.stock_quantity;
        product.stock_quantity = quantity;
        product.updated_at = at;
        Ok(StockChange {
            product_id: id,
            old_stock,
            new_stock: quantity,
        })
    }
}
