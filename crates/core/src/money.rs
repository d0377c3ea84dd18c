//! Money arithmetic on `rust_decimal::Decimal`.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Currency amounts are stored with two fractional digits.
pub const MONEY_SCALE: u32 = 2;

/// Largest unit or cost price a product may carry (`NUMERIC(12,2)`).
// 999_999_999_999 x 10^-2, split into 32-bit words for const construction.
pub const MAX_PRICE: Decimal =
    Decimal::from_parts(3567587327, 232, 0, false, MONEY_SCALE);

/// Largest line or sale total (`NUMERIC(14,2)`).
// 9_999_999_999_999_999 x 10^-2, split into 32-bit words for const construction.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(1874919423, 2328306, 0, false, MONEY_SCALE);

/// Round (banker's rounding) and pin the scale so `5` and `5.0` render alike.
pub fn normalize(amount: Decimal) -> Decimal {
    let mut value = amount.round_dp(MONEY_SCALE);
    value.rescale(MONEY_SCALE);
    value
}

/// `quantity × unit_price` for one line; totals above [`MAX_AMOUNT`] are
/// rejected.
pub fn line_total(quantity: i32, unit_price: Decimal) -> DomainResult<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(normalize)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| {
            DomainError::invalid(format!(
                "line total for {quantity} x {unit_price} exceeds {MAX_AMOUNT}"
            ))
        })
}

/// Sum of line totals, bounded by [`MAX_AMOUNT`].
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> DomainResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .map(normalize)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| DomainError::invalid(format!("sale total exceeds {MAX_AMOUNT}")))
}

/// Mean of `total` over `count` items, 0 when there are none.
pub fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        return normalize(Decimal::ZERO);
    }
    normalize(total / Decimal::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalize_fixes_the_scale() {
        assert_eq!(normalize(dec!(5)).to_string(), "5.00");
        assert_eq!(normalize(dec!(5.005)).to_string(), "5.00");
        assert_eq!(normalize(dec!(1.239)).to_string(), "1.24");
    }

    #[test]
    fn bounds_match_the_schema() {
        assert_eq!(MAX_PRICE, dec!(9999999999.99));
        assert_eq!(MAX_AMOUNT, dec!(99999999999999.99));
    }

    #[test]
    fn oversized_totals_are_rejected_not_panicking() {
        assert!(line_total(3, Decimal::MAX / dec!(2)).is_err());
        assert!(line_total(20_000, MAX_PRICE).is_err());
        assert_eq!(line_total(3, MAX_PRICE).unwrap(), dec!(29999999999.97));

        assert!(sum_amounts([MAX_AMOUNT, dec!(0.01)]).is_err());
        assert!(sum_amounts([Decimal::MAX, Decimal::MAX]).is_err());
        assert_eq!(sum_amounts([dec!(10), dec!(5.5)]).unwrap().to_string(), "15.50");
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(dec!(0), 0), dec!(0));
        assert_eq!(average(dec!(60), 3), dec!(20));
    }

    proptest! {
        #[test]
        fn line_total_is_quantity_times_price(qty in 1i32..10_000, cents in 0i64..1_000_000) {
            let price = Decimal::new(cents, 2);
            prop_assert_eq!(line_total(qty, price).unwrap(), Decimal::from(qty) * price);
        }
    }
}
