//! Stock ledger port.
//!
//! Implemented by a unit of work (database transaction or an in-memory
//! staged copy), so every call participates in the caller's commit or
//! rollback. Implementations must perform check-and-decrement as a single
//! step against the stored row, never as read-then-write in caller memory.

use async_trait::async_trait;
use serde::Serialize;

use stockroom_core::{DomainResult, ProductId};

use crate::Product;

/// Before/after quantities of one stock mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StockChange {
    pub product_id: ProductId,
    pub old_stock: i32,
    pub new_stock: i32,
}

impl StockChange {
    pub fn change(&self) -> i32 {
        self.new_stock - self.old_stock
    }
}

/// Result of a successful check-and-reserve: the product as it was when the
/// stock was checked (price snapshot) plus the applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReservation {
    pub product: Product,
    pub quantity: i32,
    pub change: StockChange,
}

#[async_trait]
pub trait StockLedger: Send {
    /// Verify the product exists (not soft-deleted) and holds at least
    /// `quantity`, then decrement it, floored at zero.
    ///
    /// Fails with `NotFound` or `InsufficientStock`; on failure nothing is
    /// changed.
    async fn check_and_reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> DomainResult<StockReservation>;

    /// Add `delta` (negative to remove), floored at zero.
    ///
    /// Fails with `NotFound` when the product row does not exist at all.
    /// Soft-deleted products are still adjusted so cancelled sales can return
    /// stock to them.
    async fn adjust_stock(&mut self, product_id: ProductId, delta: i32) -> DomainResult<StockChange>;
}
