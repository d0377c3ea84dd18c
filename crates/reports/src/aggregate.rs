//! Raw aggregates returned by a `ReportSource`, plus pure folds used by
//! sources that hold rows in memory.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_inventory::Product;
use stockroom_sales::Sale;

use crate::Granularity;

/// Count / revenue / units over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesAggregate {
    pub sales_count: u64,
    pub revenue: Decimal,
    pub items_sold: i64,
}

impl SalesAggregate {
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        sales.into_iter().fold(Self::default(), |mut acc, sale| {
            acc.sales_count += 1;
            acc.revenue = acc.revenue.saturating_add(sale.total_amount);
            acc.items_sold += sale.items_sold();
            acc
        })
    }
}

/// One period of a revenue breakdown. `key` is `YYYY-MM-DD` or `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    pub key: String,
    pub revenue: Decimal,
    pub sales_count: u64,
}

/// Group sales into ascending period buckets; empty periods are omitted.
pub fn bucket_sales<'a>(
    sales: impl IntoIterator<Item = &'a Sale>,
    granularity: Granularity,
) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for sale in sales {
        let entry = buckets
            .entry(granularity.key(sale.created_at.date_naive()))
            .or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(sale.total_amount);
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(key, (revenue, sales_count))| PeriodBucket {
            key,
            revenue,
            sales_count,
        })
        .collect()
}

/// Inventory-wide counters over live products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProductStats {
    pub total_products: u64,
    pub total_value: Decimal,
    pub total_stock: i64,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
}

impl ProductStats {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        products.into_iter().fold(Self::default(), |mut acc, p| {
            acc.total_products += 1;
            acc.total_value = acc.total_value.saturating_add(p.stock_value());
            acc.total_stock += p.stock_quantity as i64;
            if p.needs_restock() {
                acc.low_stock_count += 1;
            }
            if p.is_out_of_stock() {
                acc.out_of_stock_count += 1;
            }
            acc
        })
    }
}
