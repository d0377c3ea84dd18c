//! Field rules shared by the master-data types.

use rust_decimal::Decimal;

use stockroom_core::money::MAX_PRICE;
use stockroom_core::{DomainError, DomainResult};

pub(crate) fn length(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(DomainError::invalid(format!(
            "{field} must be {min} to {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn max_length(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn non_negative_money(field: &str, value: Decimal) -> DomainResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::invalid(format!("{field} must be >= 0")));
    }
    if value > MAX_PRICE {
        return Err(DomainError::invalid(format!("{field} must be <= {MAX_PRICE}")));
    }
    Ok(())
}

pub(crate) fn non_negative(field: &str, value: i32) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::invalid(format!("{field} must be >= 0")));
    }
    Ok(())
}
