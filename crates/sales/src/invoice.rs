//! Invoice numbers: `INV-<YYYYMMDD>-<NNNN>`.
//!
//! The discriminator alone is not globally unique; storage enforces a unique
//! constraint and the workflow regenerates on `Conflict`.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use rand::Rng;

const DISCRIMINATOR_SPACE: u32 = 10_000;

pub trait InvoiceNumberGenerator: Send + Sync {
    fn next(&self, date: NaiveDate) -> String;
}

pub fn format_invoice_number(date: NaiveDate, discriminator: u32) -> String {
    format!(
        "INV-{}-{:04}",
        date.format("%Y%m%d"),
        discriminator % DISCRIMINATOR_SPACE
    )
}

/// Uniformly random discriminator. Default for production.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomInvoiceNumbers;

impl InvoiceNumberGenerator for RandomInvoiceNumbers {
    fn next(&self, date: NaiveDate) -> String {
        let discriminator = rand::thread_rng().gen_range(0..DISCRIMINATOR_SPACE);
        format_invoice_number(date, discriminator)
    }
}

/// Monotonic per-process counter (wraps at 10 000). Deterministic for tests.
#[derive(Debug, Default)]
pub struct SequentialInvoiceNumbers {
    counter: AtomicU32,
}

impl SequentialInvoiceNumbers {
    pub fn starting_at(first: u32) -> Self {
        Self {
            counter: AtomicU32::new(first),
        }
    }
}

impl InvoiceNumberGenerator for SequentialInvoiceNumbers {
    fn next(&self, date: NaiveDate) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format_invoice_number(date, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn format_is_fixed_width() {
        assert_eq!(format_invoice_number(day(), 7), "INV-20240115-0007");
        assert_eq!(format_invoice_number(day(), 10_003), "INV-20240115-0003");
    }

    #[test]
    fn sequential_numbers_increase() {
        let generator = SequentialInvoiceNumbers::starting_at(41);
        assert_eq!(generator.next(day()), "INV-20240115-0041");
        assert_eq!(generator.next(day()), "INV-20240115-0042");
    }

    #[test]
    fn random_numbers_match_the_pattern() {
        let n = RandomInvoiceNumbers.next(day());
        assert_eq!(n.len(), "INV-20240115-0000".len());
        assert!(n.starts_with("INV-20240115-"));
        assert!(n[13..].chars().all(|c| c.is_ascii_digit()));
    }
}
