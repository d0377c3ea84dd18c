use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId, SaleId, SaleItemId, UserId};

/// Sale status lifecycle. No ordering is enforced between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Side effect attached to a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Pure status write.
    None,
    /// Put every line's quantity back on its product.
    RestoreStock,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Only completed -> cancelled gives stock back.
    pub fn transition_effect(self, to: SaleStatus) -> TransitionEffect {
        match (self, to) {
            (SaleStatus::Completed, SaleStatus::Cancelled) => TransitionEffect::RestoreStock,
            _ => TransitionEffect::None,
        }
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SaleStatus::Pending),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(DomainError::invalid(format!(
                "status must be one of pending, completed, cancelled; got '{other}'"
            ))),
        }
    }
}

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Immutable line of a recorded sale. `unit_price` is the price at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: SaleItemId,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    /// Resolved for display; not part of the stored row.
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub invoice_number: String,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
}

impl Sale {
    /// Sum of the line totals. Equal to `total_amount` for every stored sale.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|i| i.total_price).sum()
    }

    pub fn items_sold(&self) -> i64 {
        self.items.iter().map(|i| i.quantity as i64).sum()
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> SaleId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Reject empty carts and non-positive quantities.
pub fn validate_lines(lines: &[SaleLine]) -> DomainResult<()> {
    if lines.is_empty() {
        return Err(DomainError::invalid("sale must contain at least one item"));
    }
    if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
        return Err(DomainError::invalid(format!(
            "quantity for product {} must be positive, got {}",
            bad.product_id, bad.quantity
        )));
    }
    Ok(())
}

/// Indices of `lines` in ascending product-id order (stable for duplicates).
///
/// Stock rows are locked in this order so concurrent multi-item sales cannot
/// deadlock each other.
pub fn lock_order(lines: &[SaleLine]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..lines.len()).collect();
    order.sort_by_key(|&i| lines[i].product_id);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ordered_ids() -> (ProductId, ProductId) {
        let a = ProductId::new();
        let b = ProductId::new();
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn only_completed_to_cancelled_restores() {
        use SaleStatus::*;
        for from in [Pending, Completed, Cancelled] {
            for to in [Pending, Completed, Cancelled] {
                let expected = if (from, to) == (Completed, Cancelled) {
                    TransitionEffect::RestoreStock
                } else {
                    TransitionEffect::None
                };
                assert_eq!(from.transition_effect(to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn unknown_status_is_invalid() {
        assert_matches!("refunded".parse::<SaleStatus>(), Err(DomainError::InvalidRequest(_)));
        assert_eq!("cancelled".parse::<SaleStatus>().unwrap(), SaleStatus::Cancelled);
    }

    #[test]
    fn empty_cart_and_zero_quantity_rejected() {
        assert_matches!(validate_lines(&[]), Err(DomainError::InvalidRequest(_)));

        let lines = [SaleLine {
            product_id: ProductId::new(),
            quantity: 0,
        }];
        assert_matches!(validate_lines(&lines), Err(DomainError::InvalidRequest(_)));
    }

    #[test]
    fn lock_order_sorts_by_product() {
        let (low, high) = ordered_ids();
        let lines = [
            SaleLine { product_id: high, quantity: 1 },
            SaleLine { product_id: low, quantity: 2 },
            SaleLine { product_id: high, quantity: 3 },
        ];
        assert_eq!(lock_order(&lines), vec![1, 0, 2]);
    }
}
