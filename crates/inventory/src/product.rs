//! Products and the stock arithmetic applied to them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainResult, Entity, ProductId, ShelfId, SoftDelete, money};

use crate::rules;

/// Threshold used when a product is created without one (or with 0).
pub const DEFAULT_MIN_STOCK_LEVEL: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub shelf_id: ShelfId,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// At or below the configured minimum (includes out-of-stock).
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    /// Low but not yet empty; the definition used by the low-stock listing.
    pub fn needs_restock(&self) -> bool {
        self.is_low_stock() && self.stock_quantity > 0
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity == 0
    }

    /// Value of what is on hand at cost. Saturates instead of overflowing.
    pub fn stock_value(&self) -> Decimal {
        self.cost_price
            .saturating_mul(Decimal::from(self.stock_quantity))
    }

    pub fn apply(&mut self, changes: ProductChanges, now: DateTime<Utc>) {
        if let Some(category_id) = changes.category_id {
            self.category_id = category_id;
        }
        if let Some(shelf_id) = changes.shelf_id {
            self.shelf_id = shelf_id;
        }
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        if let Some(price) = changes.unit_price {
            self.unit_price = money::normalize(price);
        }
        if let Some(price) = changes.cost_price {
            self.cost_price = money::normalize(price);
        }
        if let Some(level) = changes.min_stock_level {
            self.min_stock_level = effective_min_stock(level);
        }
        self.updated_at = now;
    }
}

/// Stock after removing `quantity`, never below zero.
pub fn deduct_floor(stock: i32, quantity: i32) -> i32 {
    stock.saturating_sub(quantity).max(0)
}

/// Stock after adding `delta` (may be negative), never below zero.
pub fn adjust_floor(stock: i32, delta: i32) -> i32 {
    stock.saturating_add(delta).max(0)
}

fn effective_min_stock(level: i32) -> i32 {
    if level == 0 {
        DEFAULT_MIN_STOCK_LEVEL
    } else {
        level
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub shelf_id: ShelfId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub min_stock_level: i32,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        rules::length("name", &self.name, 3, 200)?;
        rules::max_length("description", &self.description, 1000)?;
        rules::non_negative_money("unit_price", self.unit_price)?;
        rules::non_negative_money("cost_price", self.cost_price)?;
        rules::non_negative("stock_quantity", self.stock_quantity)?;
        rules::non_negative("min_stock_level", self.min_stock_level)
    }

    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::new(),
            category_id: self.category_id,
            shelf_id: self.shelf_id,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            unit_price: money::normalize(self.unit_price),
            cost_price: money::normalize(self.cost_price),
            stock_quantity: self.stock_quantity,
            min_stock_level: effective_min_stock(self.min_stock_level),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Editable catalogue fields. Stock is changed only through the ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductChanges {
    pub category_id: Option<CategoryId>,
    pub shelf_id: Option<ShelfId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub min_stock_level: Option<i32>,
}

impl ProductChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            rules::length("name", name, 3, 200)?;
        }
        if let Some(description) = &self.description {
            rules::max_length("description", description, 1000)?;
        }
        if let Some(price) = self.unit_price {
            rules::non_negative_money("unit_price", price)?;
        }
        if let Some(price) = self.cost_price {
            rules::non_negative_money("cost_price", price)?;
        }
        if let Some(level) = self.min_stock_level {
            rules::non_negative("min_stock_level", level)?;
        }
        Ok(())
    }
}

/// Optional narrowing for product listings and the inventory report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub shelf_id: Option<ShelfId>,
    pub warehouse_id: Option<stockroom_core::WarehouseId>,
}

impl ProductFilter {
    /// Category and shelf only; warehouse membership needs the shelf table.
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id.is_none_or(|c| product.category_id == c)
            && self.shelf_id.is_none_or(|s| product.shelf_id == s)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SoftDelete for Product {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn new_product() -> NewProduct {
        NewProduct {
            category_id: CategoryId::new(),
            shelf_id: ShelfId::new(),
            name: "Widget".to_string(),
            description: String::new(),
            unit_price: dec!(5),
            cost_price: dec!(3.5),
            stock_quantity: 10,
            min_stock_level: 0,
        }
    }

    #[test]
    fn zero_min_stock_takes_default() {
        let p = new_product().into_product(Utc::now());
        assert_eq!(p.min_stock_level, DEFAULT_MIN_STOCK_LEVEL);
        assert_eq!(p.unit_price.to_string(), "5.00");
    }

    #[test]
    fn low_stock_flags() {
        let mut p = new_product().into_product(Utc::now());
        assert!(!p.is_low_stock());

        p.stock_quantity = 5;
        assert!(p.is_low_stock());
        assert!(p.needs_restock());

        p.stock_quantity = 0;
        assert!(p.is_low_stock());
        assert!(!p.needs_restock());
        assert!(p.is_out_of_stock());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut p = new_product();
        p.unit_price = dec!(-0.01);
        assert!(p.validate().is_err());
    }

    #[test]
    fn prices_above_the_storable_maximum_are_rejected() {
        let mut p = new_product();
        p.unit_price = dec!(9999999999.99);
        p.cost_price = dec!(9999999999.99);
        assert!(p.validate().is_ok());

        p.unit_price = dec!(10000000000.00);
        assert!(p.validate().is_err());

        let changes = ProductChanges {
            cost_price: Some(Decimal::MAX / dec!(2)),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn stock_value_uses_cost() {
        let p = new_product().into_product(Utc::now());
        assert_eq!(p.stock_value(), dec!(35));
    }

    proptest! {
        #[test]
        fn deduction_never_goes_negative(stock in 0i32..1_000, qty in 0i32..2_000) {
            let after = deduct_floor(stock, qty);
            prop_assert!(after >= 0);
            prop_assert_eq!(after, (stock - qty).max(0));
        }

        #[test]
        fn adjust_round_trips_when_not_floored(stock in 0i32..1_000, delta in 0i32..1_000) {
            prop_assert_eq!(adjust_floor(adjust_floor(stock, delta), -delta), stock);
        }
    }
}
