//! Audit port.
//!
//! Services receive an `AuditSink` at construction time and report every
//! stock or sale mutation through it. The concrete sink (structured logs,
//! a table, a queue) is chosen by the composition root.

use std::sync::Arc;

use serde::Serialize;

use crate::id::{ProductId, SaleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    SaleCreated {
        sale_id: SaleId,
        invoice_number: String,
        user_id: UserId,
        total_amount: String,
        item_count: usize,
    },
    StockDeducted {
        sale_id: SaleId,
        product_id: ProductId,
        old_stock: i32,
        new_stock: i32,
        quantity: i32,
    },
    StockRestored {
        sale_id: SaleId,
        product_id: ProductId,
        old_stock: i32,
        new_stock: i32,
        quantity: i32,
    },
    StockRestoreSkipped {
        sale_id: SaleId,
        product_id: ProductId,
        quantity: i32,
        reason: String,
    },
    StockSet {
        product_id: ProductId,
        user_id: UserId,
        old_stock: i32,
        new_stock: i32,
        change: i32,
        notes: Option<String>,
    },
    SaleStatusChanged {
        sale_id: SaleId,
        user_id: UserId,
        from: String,
        to: String,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaleCreated { .. } => "sale_created",
            Self::StockDeducted { .. } => "stock_deducted",
            Self::StockRestored { .. } => "stock_restored",
            Self::StockRestoreSkipped { .. } => "stock_restore_skipped",
            Self::StockSet { .. } => "stock_set",
            Self::SaleStatusChanged { .. } => "sale_status_changed",
        }
    }
}

/// Destination for audit events. Must never fail the calling operation.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: AuditEvent) {
        (**self).record(event)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
