//! Reporting over the sale ledger and the product catalogue.

pub mod aggregate;
pub mod aggregator;
pub mod range;
pub mod source;

pub use aggregate::{PeriodBucket, ProductStats, SalesAggregate};
pub use aggregator::{
    GroupBy, PeriodRevenue, ProductReport, ReportingAggregator, RevenueReport, SalesReport,
};
pub use range::ReportRange;
pub use source::{Granularity, ReportSource};
