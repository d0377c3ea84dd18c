use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::{
    CategoryId, DomainError, DomainResult, PageRequest, ProductId, ShelfId, WarehouseId,
};
use stockroom_inventory::{
    CatalogStore, Category, Product, ProductFilter, Shelf, StockChange, Warehouse,
};

use super::{PostgresStore, col, limit_offset, map_sqlx_error};

const WAREHOUSE_COLUMNS: &str = "id, code, name, address, created_at, updated_at, deleted_at";
const SHELF_COLUMNS: &str = "id, warehouse_id, code, name, created_at, updated_at, deleted_at";
const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

pub(super) const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.shelf_id, p.name, \
    p.description, p.unit_price, p.cost_price, p.stock_quantity, p.min_stock_level, \
    p.created_at, p.updated_at, p.deleted_at";

/// Live products narrowed by category ($1), shelf ($2) and warehouse ($3).
/// Expects `products p JOIN shelves sh`.
pub(super) const PRODUCT_FILTER: &str = "p.deleted_at IS NULL \
    AND ($1::uuid IS NULL OR p.category_id = $1) \
    AND ($2::uuid IS NULL OR p.shelf_id = $2) \
    AND ($3::uuid IS NULL OR sh.warehouse_id = $3)";

pub(super) fn filter_binds(filter: &ProductFilter) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
    (
        filter.category_id.map(|id| *id.as_uuid()),
        filter.shelf_id.map(|id| *id.as_uuid()),
        filter.warehouse_id.map(|id| *id.as_uuid()),
    )
}

fn warehouse_from_row(row: &PgRow) -> DomainResult<Warehouse> {
    Ok(Warehouse {
        id: WarehouseId::from_uuid(col(row, "id")?),
        code: col(row, "code")?,
        name: col(row, "name")?,
        address: col(row, "address")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        deleted_at: col(row, "deleted_at")?,
    })
}

fn shelf_from_row(row: &PgRow) -> DomainResult<Shelf> {
    Ok(Shelf {
        id: ShelfId::from_uuid(col(row, "id")?),
        warehouse_id: WarehouseId::from_uuid(col(row, "warehouse_id")?),
        code: col(row, "code")?,
        name: col(row, "name")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        deleted_at: col(row, "deleted_at")?,
    })
}

fn category_from_row(row: &PgRow) -> DomainResult<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        description: col(row, "description")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        deleted_at: col(row, "deleted_at")?,
    })
}

pub(super) fn product_from_row(row: &PgRow) -> DomainResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(col(row, "id")?),
        category_id: CategoryId::from_uuid(col(row, "category_id")?),
        shelf_id: ShelfId::from_uuid(col(row, "shelf_id")?),
        name: col(row, "name")?,
        description: col(row, "description")?,
        unit_price: col(row, "unit_price")?,
        cost_price: col(row, "cost_price")?,
        stock_quantity: col(row, "stock_quantity")?,
        min_stock_level: col(row, "min_stock_level")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        deleted_at: col(row, "deleted_at")?,
    })
}

fn decode_all<T>(rows: &[PgRow], decode: fn(&PgRow) -> DomainResult<T>) -> DomainResult<Vec<T>> {
    rows.iter().map(decode).collect()
}

impl PostgresStore {
    async fn count(&self, operation: &str, sql: &str) -> DomainResult<u64> {
        let total: i64 = sqlx::query_scalar(sql)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(total as u64)
    }

    /// `UPDATE <table> SET deleted_at = $2, updated_at = $2` on a live row.
    async fn soft_delete(&self, table: &str, id: Uuid, at: DateTime<Utc>) -> DomainResult<bool> {
        let sql = format!(
            "UPDATE {table} SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("soft_delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// The only unique index on warehouses besides the key is the live code.
fn code_conflict(operation: &str, err: sqlx::Error) -> DomainError {
    match map_sqlx_error(operation, err) {
        DomainError::Conflict(_) => DomainError::conflict("warehouse code already exists"),
        other => other,
    }
}

fn ensure_updated(rows_affected: u64, what: &str) -> DomainResult<()> {
    if rows_affected == 0 {
        return Err(DomainError::not_found(what));
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for PostgresStore {
    // -------------------------
    // Warehouses
    // -------------------------

    async fn insert_warehouse(&self, w: &Warehouse) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO warehouses (id, code, name, address, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*w.id.as_uuid())
        .bind(&w.code)
        .bind(&w.name)
        .bind(&w.address)
        .bind(w.created_at)
        .bind(w.updated_at)
        .bind(w.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| code_conflict("insert_warehouse", e))?;
        Ok(())
    }

    async fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Option<Warehouse>> {
        let sql = format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_warehouse", e))?;
        row.as_ref().map(warehouse_from_row).transpose()
    }

    async fn update_warehouse(&self, w: &Warehouse) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE warehouses SET code = $2, name = $3, address = $4, updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*w.id.as_uuid())
        .bind(&w.code)
        .bind(&w.name)
        .bind(&w.address)
        .bind(w.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| code_conflict("update_warehouse", e))?;
        ensure_updated(result.rows_affected(), "warehouse")
    }

    async fn list_warehouses(&self, page: PageRequest) -> DomainResult<(Vec<Warehouse>, u64)> {
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_warehouses", e))?;
        let total = self
            .count(
                "count_warehouses",
                "SELECT COUNT(*) FROM warehouses WHERE deleted_at IS NULL",
            )
            .await?;
        Ok((decode_all(&rows, warehouse_from_row)?, total))
    }

    async fn soft_delete_warehouse(&self, id: WarehouseId, at: DateTime<Utc>) -> DomainResult<bool> {
        self.soft_delete("warehouses", *id.as_uuid(), at).await
    }

    // -------------------------
    // Shelves
    // -------------------------

    async fn insert_shelf(&self, s: &Shelf) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shelves (id, warehouse_id, code, name, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*s.id.as_uuid())
        .bind(*s.warehouse_id.as_uuid())
        .bind(&s.code)
        .bind(&s.name)
        .bind(s.created_at)
        .bind(s.updated_at)
        .bind(s.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_shelf", e))?;
        Ok(())
    }

    async fn get_shelf(&self, id: ShelfId) -> DomainResult<Option<Shelf>> {
        let sql = format!("SELECT {SHELF_COLUMNS} FROM shelves WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_shelf", e))?;
        row.as_ref().map(shelf_from_row).transpose()
    }

    async fn update_shelf(&self, s: &Shelf) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE shelves SET warehouse_id = $2, code = $3, name = $4, updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*s.id.as_uuid())
        .bind(*s.warehouse_id.as_uuid())
        .bind(&s.code)
        .bind(&s.name)
        .bind(s.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_shelf", e))?;
        ensure_updated(result.rows_affected(), "shelf")
    }

    async fn list_shelves(
        &self,
        warehouse_id: Option<WarehouseId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Shelf>, u64)> {
        let (limit, offset) = limit_offset(page);
        let warehouse = warehouse_id.map(|id| *id.as_uuid());
        let sql = format!(
            "SELECT {SHELF_COLUMNS} FROM shelves \
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR warehouse_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(warehouse)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_shelves", e))?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shelves WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR warehouse_id = $1)",
        )
        .bind(warehouse)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_shelves", e))?;
        Ok((decode_all(&rows, shelf_from_row)?, total as u64))
    }

    async fn soft_delete_shelf(&self, id: ShelfId, at: DateTime<Utc>) -> DomainResult<bool> {
        self.soft_delete("shelves", *id.as_uuid(), at).await
    }

    // -------------------------
    // Categories
    // -------------------------

    async fn insert_category(&self, c: &Category) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.description)
        .bind(c.created_at)
        .bind(c.updated_at)
        .bind(c.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn update_category(&self, c: &Category) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET name = $2, description = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*c.id.as_uuid())
        .bind(&c.name)
        .bind(&c.description)
        .bind(c.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;
        ensure_updated(result.rows_affected(), "category")
    }

    async fn list_categories(&self, page: PageRequest) -> DomainResult<(Vec<Category>, u64)> {
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        let total = self
            .count(
                "count_categories",
                "SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL",
            )
            .await?;
        Ok((decode_all(&rows, category_from_row)?, total))
    }

    async fn soft_delete_category(&self, id: CategoryId, at: DateTime<Utc>) -> DomainResult<bool> {
        self.soft_delete("categories", *id.as_uuid(), at).await
    }

    // -------------------------
    // Products
    // -------------------------

    #[instrument(skip(self, p), fields(product_id = %p.id), err)]
    async fn insert_product(&self, p: &Product) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, shelf_id, name, description, unit_price, cost_price,
                stock_quantity, min_stock_level, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*p.id.as_uuid())
        .bind(*p.category_id.as_uuid())
        .bind(*p.shelf_id.as_uuid())
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.unit_price)
        .bind(p.cost_price)
        .bind(p.stock_quantity)
        .bind(p.min_stock_level)
        .bind(p.created_at)
        .bind(p.updated_at)
        .bind(p.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn update_product(&self, p: &Product) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = $2, shelf_id = $3, name = $4, description = $5,
                unit_price = $6, cost_price = $7, min_stock_level = $8, updated_at = $9
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*p.id.as_uuid())
        .bind(*p.category_id.as_uuid())
        .bind(*p.shelf_id.as_uuid())
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.unit_price)
        .bind(p.cost_price)
        .bind(p.min_stock_level)
        .bind(p.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        ensure_updated(result.rows_affected(), "product")
    }

    async fn list_products(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> DomainResult<(Vec<Product>, u64)> {
        let (limit, offset) = limit_offset(page);
        let (category, shelf, warehouse) = filter_binds(&filter);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p JOIN shelves sh ON sh.id = p.shelf_id \
             WHERE {PRODUCT_FILTER} ORDER BY p.created_at DESC, p.id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query(&sql)
            .bind(category)
            .bind(shelf)
            .bind(warehouse)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM products p JOIN shelves sh ON sh.id = p.shelf_id WHERE {PRODUCT_FILTER}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(category)
            .bind(shelf)
            .bind(warehouse)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        Ok((decode_all(&rows, product_from_row)?, total as u64))
    }

    async fn list_low_stock_products(&self, page: PageRequest) -> DomainResult<(Vec<Product>, u64)> {
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.deleted_at IS NULL AND p.stock_quantity > 0 \
               AND p.stock_quantity <= p.min_stock_level \
             ORDER BY p.stock_quantity ASC, p.name ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_low_stock_products", e))?;
        let total = self
            .count(
                "count_low_stock_products",
                "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL \
                 AND stock_quantity > 0 AND stock_quantity <= min_stock_level",
            )
            .await?;
        Ok((decode_all(&rows, product_from_row)?, total))
    }

    async fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> DomainResult<bool> {
        self.soft_delete("products", *id.as_uuid(), at).await
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn set_stock(
        &self,
        id: ProductId,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<StockChange> {
        let row = sqlx::query(
            r#"
            WITH old AS (
                SELECT id, stock_quantity FROM products
                WHERE id = $1 AND deleted_at IS NULL
                FOR UPDATE
            )
            UPDATE products p
            SET stock_quantity = $2, updated_at = $3
            FROM old
            WHERE p.id = old.id
            RETURNING old.stock_quantity AS old_stock, p.stock_quantity AS new_stock
            "#,
        )
        .bind(*id.as_uuid())
        .bind(quantity)
        .bind(at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_stock", e))?
        .ok_or_else(|| DomainError::not_found("product"))?;

        Ok(StockChange {
            product_id: id,
            old_stock: col(&row, "old_stock")?,
            new_stock: col(&row, "new_stock")?,
        })
    }
}
