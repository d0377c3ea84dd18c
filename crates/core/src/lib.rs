//! `stockroom-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the error model, pagination, money helpers
//! and the audit port. No storage or transport concerns live here.

pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod pagination;

pub use audit::{AuditEvent, AuditSink, NoopAuditSink};
pub use entity::{Entity, SoftDelete};
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ProductId, SaleId, SaleItemId, ShelfId, UserId, WarehouseId};
pub use pagination::{PageInfo, PageRequest, Paged};
