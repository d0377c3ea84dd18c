use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::instrument;

use stockroom_core::DomainResult;
use stockroom_inventory::ProductFilter;
use stockroom_reports::{
    Granularity, PeriodBucket, ProductStats, ReportRange, ReportSource, SalesAggregate,
};
use stockroom_sales::SaleStatus;

use super::catalog::{PRODUCT_FILTER, filter_binds};
use super::{PostgresStore, col, map_sqlx_error};

fn period_format(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Day => "YYYY-MM-DD",
        Granularity::Month => "YYYY-MM",
    }
}

#[async_trait]
impl ReportSource for PostgresStore {
    #[instrument(skip(self), err)]
    async fn query_sales_in_range(
        &self,
        status: SaleStatus,
        range: ReportRange,
    ) -> DomainResult<SalesAggregate> {
        let (from, until) = range.bounds();
        let row = sqlx::query(
            r#"
            WITH scoped AS (
                SELECT id, total_amount FROM sales
                WHERE status = $1 AND created_at >= $2 AND created_at < $3
            )
            SELECT
                (SELECT COUNT(*) FROM scoped) AS sales_count,
                (SELECT COALESCE(SUM(total_amount), 0) FROM scoped) AS revenue,
                (SELECT COALESCE(SUM(si.quantity), 0)::BIGINT
                   FROM sale_items si JOIN scoped ON scoped.id = si.sale_id) AS items_sold
            "#,
        )
        .bind(status.as_str())
        .bind(from)
        .bind(until)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_sales_in_range", e))?;

        let sales_count: i64 = col(&row, "sales_count")?;
        Ok(SalesAggregate {
            sales_count: sales_count as u64,
            revenue: col(&row, "revenue")?,
            items_sold: col(&row, "items_sold")?,
        })
    }

    #[instrument(skip(self), err)]
    async fn revenue_by_period(
        &self,
        range: ReportRange,
        granularity: Granularity,
    ) -> DomainResult<Vec<PeriodBucket>> {
        let (from, until) = range.bounds();
        let rows = sqlx::query(
            r#"
            SELECT
                TO_CHAR(created_at AT TIME ZONE 'UTC', $3) AS period,
                COALESCE(SUM(total_amount), 0) AS revenue,
                COUNT(*) AS sales_count
            FROM sales
            WHERE status = 'completed' AND created_at >= $1 AND created_at < $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(period_format(granularity))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revenue_by_period", e))?;

        rows.iter()
            .map(|row| {
                let sales_count: i64 = col(row, "sales_count")?;
                Ok(PeriodBucket {
                    key: col(row, "period")?,
                    revenue: col::<Decimal>(row, "revenue")?,
                    sales_count: sales_count as u64,
                })
            })
            .collect()
    }

    async fn product_stats(&self, filter: ProductFilter) -> DomainResult<ProductStats> {
        let (category, shelf, warehouse) = filter_binds(&filter);
        let sql = format!(
            "SELECT \
                COUNT(*) AS total_products, \
                COALESCE(SUM(p.cost_price * p.stock_quantity), 0) AS total_value, \
                COALESCE(SUM(p.stock_quantity), 0)::BIGINT AS total_stock, \
                COUNT(*) FILTER (WHERE p.stock_quantity > 0 \
                    AND p.stock_quantity <= p.min_stock_level) AS low_stock_count, \
                COUNT(*) FILTER (WHERE p.stock_quantity = 0) AS out_of_stock_count \
             FROM products p JOIN shelves sh ON sh.id = p.shelf_id \
             WHERE {PRODUCT_FILTER}"
        );
        let row = sqlx::query(&sql)
            .bind(category)
            .bind(shelf)
            .bind(warehouse)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_stats", e))?;

        let total_products: i64 = col(&row, "total_products")?;
        let low: i64 = col(&row, "low_stock_count")?;
        let out: i64 = col(&row, "out_of_stock_count")?;
        Ok(ProductStats {
            total_products: total_products as u64,
            total_value: col(&row, "total_value")?,
            total_stock: col(&row, "total_stock")?,
            low_stock_count: low as u64,
            out_of_stock_count: out as u64,
        })
    }
}
