use async_trait::async_trait;

use stockroom_core::DomainResult;
use stockroom_inventory::ProductFilter;
use stockroom_reports::aggregate::bucket_sales;
use stockroom_reports::{
    Granularity, PeriodBucket, ProductStats, ReportRange, ReportSource, SalesAggregate,
};
use stockroom_sales::SaleStatus;

use super::InMemoryStore;

#[async_trait]
impl ReportSource for InMemoryStore {
    async fn query_sales_in_range(
        &self,
        status: SaleStatus,
        range: ReportRange,
    ) -> DomainResult<SalesAggregate> {
        let t = self.tables.lock().await;
        Ok(SalesAggregate::from_sales(
            t.sales
                .values()
                .filter(|s| s.status == status && range.contains(s.created_at)),
        ))
    }

    async fn revenue_by_period(
        &self,
        range: ReportRange,
        granularity: Granularity,
    ) -> DomainResult<Vec<PeriodBucket>> {
        let t = self.tables.lock().await;
        Ok(bucket_sales(
            t.sales
                .values()
                .filter(|s| s.status == SaleStatus::Completed && range.contains(s.created_at)),
            granularity,
        ))
    }

    async fn product_stats(&self, filter: ProductFilter) -> DomainResult<ProductStats> {
        let t = self.tables.lock().await;
        Ok(ProductStats::from_products(
            t.products.values().filter(|p| t.product_matches(&filter, p)),
        ))
    }
}
