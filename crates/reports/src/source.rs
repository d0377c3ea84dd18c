//! Read-side port for reports.

use async_trait::async_trait;
use chrono::NaiveDate;

use stockroom_core::DomainResult;
use stockroom_inventory::ProductFilter;
use stockroom_sales::SaleStatus;

use crate::{PeriodBucket, ProductStats, ReportRange, SalesAggregate};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// Sortable bucket key for a calendar date.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Month => date.format("%Y-%m").to_string(),
        }
    }
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Aggregate over sales with `status` created inside `range`.
    async fn query_sales_in_range(
        &self,
        status: SaleStatus,
        range: ReportRange,
    ) -> DomainResult<SalesAggregate>;

    /// Completed-sale revenue per period inside `range`, ascending by key.
    async fn revenue_by_period(
        &self,
        range: ReportRange,
        granularity: Granularity,
    ) -> DomainResult<Vec<PeriodBucket>>;

    async fn product_stats(&self, filter: ProductFilter) -> DomainResult<ProductStats>;
}
