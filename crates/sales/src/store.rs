//! Sale persistence ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{DomainResult, PageRequest, SaleId, UserId};
use stockroom_inventory::StockLedger;

use crate::{Sale, SaleStatus};

/// Sale writes inside a unit of work.
#[async_trait]
pub trait SaleRecorder: Send {
    /// Persist header and every item together. A duplicate invoice number
    /// fails with `Conflict`.
    async fn save_sale(&mut self, sale: &Sale) -> DomainResult<()>;

    /// Load a sale and hold it against concurrent status changes until the
    /// unit of work ends.
    async fn load_sale_for_update(&mut self, id: SaleId) -> DomainResult<Option<Sale>>;

    async fn set_sale_status(
        &mut self,
        id: SaleId,
        status: SaleStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;
}

/// A transaction spanning stock and sale writes.
///
/// Dropping a unit of work without `commit` discards every change.
#[async_trait]
pub trait SaleUnitOfWork: StockLedger + SaleRecorder {
    async fn commit(self: Box<Self>) -> DomainResult<()>;
    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn begin(&self) -> DomainResult<Box<dyn SaleUnitOfWork>>;

    async fn load_sale(&self, id: SaleId) -> DomainResult<Option<Sale>>;

    /// Newest first. `owner` restricts to one user's sales.
    async fn list_sales(
        &self,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Sale>, u64)>;
}
