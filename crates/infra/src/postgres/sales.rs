use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::{
    DomainError, DomainResult, PageRequest, ProductId, SaleId, SaleItemId, UserId,
};
use stockroom_inventory::{StockChange, StockLedger, StockReservation};
use stockroom_sales::{Sale, SaleItem, SaleRecorder, SaleStatus, SaleStore, SaleUnitOfWork};

use super::catalog::{PRODUCT_COLUMNS, product_from_row};
use super::{PostgresStore, col, limit_offset, map_sqlx_error};

const SALE_COLUMNS: &str =
    "id, invoice_number, user_id, total_amount, status, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, quantity, unit_price, total_price, created_at";

/// A sale transaction. Dropped without `commit`, SQLx rolls it back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn sale_header_from_row(row: &PgRow) -> DomainResult<Sale> {
    let status: String = col(row, "status")?;
    Ok(Sale {
        id: SaleId::from_uuid(col(row, "id")?),
        invoice_number: col(row, "invoice_number")?,
        user_id: UserId::from_uuid(col(row, "user_id")?),
        total_amount: col(row, "total_amount")?,
        status: status.parse::<SaleStatus>().map_err(|_| {
            DomainError::internal(format!("unknown sale status '{status}' in sales table"))
        })?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &PgRow) -> DomainResult<SaleItem> {
    Ok(SaleItem {
        id: SaleItemId::from_uuid(col(row, "id")?),
        sale_id: SaleId::from_uuid(col(row, "sale_id")?),
        product_id: ProductId::from_uuid(col(row, "product_id")?),
        product_name: col(row, "product_name")?,
        quantity: col(row, "quantity")?,
        unit_price: col(row, "unit_price")?,
        total_price: col(row, "total_price")?,
        created_at: col(row, "created_at")?,
    })
}

/// Attach items (in their recorded order) to already-loaded headers.
async fn attach_items(conn: &mut PgConnection, sales: &mut [Sale]) -> DomainResult<()> {
    if sales.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = sales.iter().map(|s| *s.id.as_uuid()).collect();
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ANY($1) ORDER BY sale_id, position"
    );
    let rows = sqlx::query(&sql)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("load_sale_items", e))?;

    let mut by_sale: HashMap<SaleId, Vec<SaleItem>> = HashMap::new();
    for row in &rows {
        let item = item_from_row(row)?;
        by_sale.entry(item.sale_id).or_default().push(item);
    }
    for sale in sales.iter_mut() {
        sale.items = by_sale.remove(&sale.id).unwrap_or_default();
    }
    Ok(())
}

#[async_trait]
impl StockLedger for PgUnitOfWork {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn check_and_reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> DomainResult<StockReservation> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.id = $1 AND p.deleted_at IS NULL FOR UPDATE"
        );
        let row = sqlx::query(&sql)
            .bind(*product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_product", e))?
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        let product = product_from_row(&row)?;

        if product.stock_quantity < quantity {
            return Err(DomainError::InsufficientStock {
                product_id,
                product_name: product.name,
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        let new_stock: i32 = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock_quantity = GREATEST(stock_quantity - $2, 0), updated_at = NOW()
            WHERE id = $1
            RETURNING stock_quantity
            "#,
        )
        .bind(*product_id.as_uuid())
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("deduct_stock", e))?;

        let change = StockChange {
            product_id,
            old_stock: product.stock_quantity,
            new_stock,
        };
        Ok(StockReservation {
            product,
            quantity,
            change,
        })
    }

    async fn adjust_stock(&mut self, product_id: ProductId, delta: i32) -> DomainResult<StockChange> {
        let row = sqlx::query(
            r#"
            WITH old AS (
                SELECT id, stock_quantity FROM products WHERE id = $1 FOR UPDATE
            )
            UPDATE products p
            SET stock_quantity = GREATEST(p.stock_quantity + $2, 0), updated_at = NOW()
            FROM old
            WHERE p.id = old.id
            RETURNING old.stock_quantity AS old_stock, p.stock_quantity AS new_stock
            "#,
        )
        .bind(*product_id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("adjust_stock", e))?
        .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

        Ok(StockChange {
            product_id,
            old_stock: col(&row, "old_stock")?,
            new_stock: col(&row, "new_stock")?,
        })
    }
}

#[async_trait]
impl SaleRecorder for PgUnitOfWork {
    #[instrument(skip(self, sale), fields(sale_id = %sale.id, invoice_number = %sale.invoice_number), err)]
    async fn save_sale(&mut self, sale: &Sale) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, invoice_number, user_id, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*sale.id.as_uuid())
        .bind(&sale.invoice_number)
        .bind(*sale.user_id.as_uuid())
        .bind(sale.total_amount)
        .bind(sale.status.as_str())
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale", e))?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, product_name, quantity, unit_price,
                    total_price, position, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(*item.id.as_uuid())
            .bind(*item.sale_id.as_uuid())
            .bind(*item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(position as i32)
            .bind(item.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sale_item", e))?;
        }
        Ok(())
    }

    async fn load_sale_for_update(&mut self, id: SaleId) -> DomainResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE");
        let Some(row) = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_sale", e))?
        else {
            return Ok(None);
        };
        let mut sales = vec![sale_header_from_row(&row)?];
        attach_items(&mut self.tx, &mut sales).await?;
        Ok(sales.pop())
    }

    async fn set_sale_status(
        &mut self,
        id: SaleId,
        status: SaleStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let result = sqlx::query("UPDATE sales SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(status.as_str())
            .bind(at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_sale_status", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("sale"));
        }
        Ok(())
    }
}

#[async_trait]
impl SaleUnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

#[async_trait]
impl SaleStore for PostgresStore {
    async fn begin(&self) -> DomainResult<Box<dyn SaleUnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn load_sale(&self, id: SaleId) -> DomainResult<Option<Sale>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1");
        let Some(row) = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("load_sale", e))?
        else {
            return Ok(None);
        };
        let mut sales = vec![sale_header_from_row(&row)?];
        attach_items(&mut conn, &mut sales).await?;
        Ok(sales.pop())
    }

    async fn list_sales(
        &self,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Sale>, u64)> {
        let (limit, offset) = limit_offset(page);
        let owner = owner.map(|id| *id.as_uuid());
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE ($1::uuid IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(owner)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("list_sales", e))?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE ($1::uuid IS NULL OR user_id = $1)")
                .bind(owner)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| map_sqlx_error("count_sales", e))?;

        let mut sales = rows
            .iter()
            .map(sale_header_from_row)
            .collect::<DomainResult<Vec<_>>>()?;
        attach_items(&mut conn, &mut sales).await?;
        Ok((sales, total as u64))
    }
}
