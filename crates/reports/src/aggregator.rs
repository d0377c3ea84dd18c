//! Reporting aggregator: summary statistics over completed sales, optional
//! per-period revenue, and the product inventory report.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{instrument, warn};

use stockroom_core::{DomainResult, money};
use stockroom_inventory::ProductFilter;
use stockroom_sales::SaleStatus;

use crate::{Granularity, PeriodBucket, ReportRange, ReportSource, SalesAggregate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub total_items_sold: i64,
    pub average_sale: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SalesReport {
    fn from_aggregate(agg: SalesAggregate, range: ReportRange) -> Self {
        Self {
            total_sales: agg.sales_count,
            total_revenue: money::normalize(agg.revenue),
            total_items_sold: agg.items_sold,
            average_sale: money::average(agg.revenue, agg.sales_count),
            start_date: range.start,
            end_date: range.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRevenue {
    /// Display label ("2024-01-15" or "January 2024").
    pub period: String,
    /// Sortable key ("2024-01-15" or "2024-01").
    pub date: String,
    pub revenue: Decimal,
    pub sales_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueReport {
    #[serde(flatten)]
    pub summary: SalesReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_revenue: Option<Vec<PeriodRevenue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_revenue: Option<Vec<PeriodRevenue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductReport {
    pub total_products: u64,
    pub total_value: Decimal,
    pub total_stock: i64,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub avg_stock_per_product: Decimal,
}

/// `group_by` query values. Anything unrecognised means "no breakdown".
pub struct GroupBy;

impl GroupBy {
    pub fn parse(value: &str) -> Option<Granularity> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Granularity::Day),
            "month" => Some(Granularity::Month),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ReportingAggregator {
    source: Arc<dyn ReportSource>,
}

impl ReportingAggregator {
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self { source }
    }

    #[instrument(skip(self), err)]
    pub async fn get_sales_report(&self, start: &str, end: &str) -> DomainResult<SalesReport> {
        let range = ReportRange::parse(start, end)?;
        self.summary(range).await
    }

    /// Summary plus an optional breakdown. A failing breakdown is logged and
    /// dropped; the summary is still returned.
    #[instrument(skip(self), err)]
    pub async fn get_revenue_report(
        &self,
        start: &str,
        end: &str,
        group_by: &str,
    ) -> DomainResult<RevenueReport> {
        let range = ReportRange::parse(start, end)?;
        let summary = self.summary(range).await?;

        let mut report = RevenueReport {
            summary,
            daily_revenue: None,
            monthly_revenue: None,
        };

        let Some(granularity) = GroupBy::parse(group_by) else {
            return Ok(report);
        };

        let buckets = match self.source.revenue_by_period(range, granularity).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, group_by, "revenue breakdown failed; returning summary only");
                return Ok(report);
            }
        };

        let periods = buckets
            .into_iter()
            .map(|b| to_period(b, granularity))
            .collect::<Vec<_>>();
        match granularity {
            Granularity::Day => report.daily_revenue = Some(periods),
            Granularity::Month => report.monthly_revenue = Some(periods),
        }
        Ok(report)
    }

    pub async fn get_product_report(&self, filter: ProductFilter) -> DomainResult<ProductReport> {
        let stats = self.source.product_stats(filter).await?;
        let avg = if stats.total_products == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(stats.total_stock) / Decimal::from(stats.total_products)
        };

        Ok(ProductReport {
            total_products: stats.total_products,
            total_value: money::normalize(stats.total_value),
            total_stock: stats.total_stock,
            low_stock_count: stats.low_stock_count,
            out_of_stock_count: stats.out_of_stock_count,
            avg_stock_per_product: money::normalize(avg),
        })
    }

    async fn summary(&self, range: ReportRange) -> DomainResult<SalesReport> {
        let agg = self
            .source
            .query_sales_in_range(SaleStatus::Completed, range)
            .await?;
        Ok(SalesReport::from_aggregate(agg, range))
    }
}

fn to_period(bucket: PeriodBucket, granularity: Granularity) -> PeriodRevenue {
    let period = match granularity {
        Granularity::Day => bucket.key.clone(),
        Granularity::Month => month_label(&bucket.key).unwrap_or_else(|| bucket.key.clone()),
    };
    PeriodRevenue {
        period,
        date: bucket.key,
        revenue: money::normalize(bucket.revenue),
        sales_count: bucket.sales_count,
    }
}

/// "2024-01" -> "January 2024".
fn month_label(key: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").ok()?;
    Some(first.format("%B %Y").to_string())
}
