//! Sale workflow engine.
//!
//! Turns a cart into a durable sale while enforcing stock availability, and
//! applies status changes with their compensating stock restoration.
//!
//! Every mutation runs inside one `SaleUnitOfWork`:
//! - create: reserve stock per line (ascending product id), snapshot prices,
//!   write header + items, commit. Any failure rolls back all of it.
//! - status change: lock the sale, write the status, restore stock when
//!   completed -> cancelled, commit. A product row that no longer exists is
//!   skipped and reported; any other failure rolls back the status change too.
//!
//! Audit events are emitted only after a successful commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use stockroom_auth::{Permission, Principal, authorize, authorize_self_or};
use stockroom_core::{
    AuditEvent, AuditSink, DomainError, DomainResult, PageRequest, Paged, ProductId, SaleId,
    SaleItemId, UserId, money,
};
use stockroom_inventory::{StockChange, StockReservation};

use crate::sale::{lock_order, validate_lines};
use crate::{
    InvoiceNumberGenerator, Sale, SaleItem, SaleLine, SaleStatus, SaleStore, SaleUnitOfWork,
    TransitionEffect,
};

/// Attempts at finding an unused invoice number before giving up.
pub const DEFAULT_INVOICE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct SaleWorkflow {
    store: Arc<dyn SaleStore>,
    invoices: Arc<dyn InvoiceNumberGenerator>,
    audit: Arc<dyn AuditSink>,
    invoice_attempts: u32,
}

/// What a committed status change did to stock.
struct Restoration {
    restored: Vec<(i32, StockChange)>,
    skipped: Vec<(ProductId, i32, String)>,
}

impl SaleWorkflow {
    pub fn new(
        store: Arc<dyn SaleStore>,
        invoices: Arc<dyn InvoiceNumberGenerator>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            invoices,
            audit,
            invoice_attempts: DEFAULT_INVOICE_ATTEMPTS,
        }
    }

    pub fn with_invoice_attempts(mut self, attempts: u32) -> Self {
        self.invoice_attempts = attempts.max(1);
        self
    }

    // -------------------------
    // CreateSale
    // -------------------------

    /// Record a completed sale for `user_id`, deducting stock for every line.
    #[instrument(skip(self, lines), fields(user_id = %user_id, lines = lines.len()), err)]
    pub async fn create_sale(
        &self,
        user_id: UserId,
        lines: Vec<SaleLine>,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        validate_lines(&lines)?;

        let mut attempt = 1;
        loop {
            let invoice_number = self.invoices.next(now.date_naive());
            match self.try_create(user_id, &lines, invoice_number.clone(), now).await {
                Err(DomainError::Conflict(reason)) if attempt < self.invoice_attempts => {
                    warn!(%invoice_number, attempt, %reason, "invoice number taken; regenerating");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_create(
        &self,
        user_id: UserId,
        lines: &[SaleLine],
        invoice_number: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        let mut uow = self.store.begin().await?;

        let staged = stage_sale(uow.as_mut(), user_id, lines, invoice_number, now).await;
        let (sale, reservations) = match staged {
            Ok(v) => v,
            Err(e) => {
                discard(uow).await;
                return Err(e);
            }
        };

        uow.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_number = %sale.invoice_number,
            total_amount = %sale.total_amount,
            "sale created"
        );
        self.audit.record(AuditEvent::SaleCreated {
            sale_id: sale.id,
            invoice_number: sale.invoice_number.clone(),
            user_id,
            total_amount: sale.total_amount.to_string(),
            item_count: sale.items.len(),
        });
        for r in reservations {
            self.audit.record(AuditEvent::StockDeducted {
                sale_id: sale.id,
                product_id: r.change.product_id,
                old_stock: r.change.old_stock,
                new_stock: r.change.new_stock,
                quantity: r.quantity,
            });
        }

        Ok(sale)
    }

    // -------------------------
    // GetSale / ListSales
    // -------------------------

    pub async fn get_sale(&self, id: SaleId) -> DomainResult<Sale> {
        self.store
            .load_sale(id)
            .await?
            .ok_or_else(|| DomainError::not_found("sale"))
    }

    /// `owner = Some(..)` limits the listing to that user's sales.
    pub async fn list_sales(
        &self,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> DomainResult<Paged<Sale>> {
        let (items, total) = self.store.list_sales(owner, page).await?;
        Ok(Paged::new(items, page, total))
    }

    /// Owner of the sale, or anyone allowed to read all sales.
    pub async fn get_sale_for(&self, actor: &Principal, id: SaleId) -> DomainResult<Sale> {
        let sale = self.get_sale(id).await?;
        authorize_self_or(actor, sale.user_id, &Permission::SALES_READ_ALL)?;
        Ok(sale)
    }

    /// Staff see their own sales; admins see everything.
    pub async fn list_sales_for(
        &self,
        actor: &Principal,
        page: PageRequest,
    ) -> DomainResult<Paged<Sale>> {
        let owner = if actor.has(&Permission::SALES_READ_ALL) {
            None
        } else {
            Some(actor.user_id)
        };
        self.list_sales(owner, page).await
    }

    // -------------------------
    // UpdateSaleStatus
    // -------------------------

    /// Change a sale's status; completed -> cancelled puts stock back.
    pub async fn update_sale_status(
        &self,
        id: SaleId,
        status: &str,
        changed_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        self.change_status(None, id, status, changed_by, now).await
    }

    /// Ownership-checked status change. The check runs against the locked row.
    pub async fn update_sale_status_for(
        &self,
        actor: &Principal,
        id: SaleId,
        status: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        self.change_status(Some(actor), id, status, actor.user_id, now)
            .await
    }

    #[instrument(skip(self, actor), fields(sale_id = %id), err)]
    async fn change_status(
        &self,
        actor: Option<&Principal>,
        id: SaleId,
        status: &str,
        changed_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        let new_status: SaleStatus = status.parse()?;

        let mut uow = self.store.begin().await?;
        let outcome = apply_status(uow.as_mut(), actor, id, new_status, now).await;
        let (sale, previous, restoration) = match outcome {
            Ok(v) => v,
            Err(e) => {
                discard(uow).await;
                return Err(e);
            }
        };
        uow.commit().await?;

        info!(from = %previous, to = %new_status, "sale status changed");
        self.audit.record(AuditEvent::SaleStatusChanged {
            sale_id: id,
            user_id: changed_by,
            from: previous.to_string(),
            to: new_status.to_string(),
        });
        for (quantity, change) in restoration.restored {
            self.audit.record(AuditEvent::StockRestored {
                sale_id: id,
                product_id: change.product_id,
                old_stock: change.old_stock,
                new_stock: change.new_stock,
                quantity,
            });
        }
        for (product_id, quantity, reason) in restoration.skipped {
            self.audit.record(AuditEvent::StockRestoreSkipped {
                sale_id: id,
                product_id,
                quantity,
                reason,
            });
        }

        Ok(sale)
    }

    /// Create a sale on behalf of the acting principal.
    pub async fn create_sale_for(
        &self,
        actor: &Principal,
        lines: Vec<SaleLine>,
        now: DateTime<Utc>,
    ) -> DomainResult<Sale> {
        authorize(actor, &Permission::SALES_CREATE)?;
        self.create_sale(actor.user_id, lines, now).await
    }
}

async fn stage_sale(
    uow: &mut dyn SaleUnitOfWork,
    user_id: UserId,
    lines: &[SaleLine],
    invoice_number: String,
    now: DateTime<Utc>,
) -> DomainResult<(Sale, Vec<StockReservation>)> {
    let mut reserved: Vec<Option<StockReservation>> = vec![None; lines.len()];
    for idx in lock_order(lines) {
        let line = lines[idx];
        let reservation = uow
            .check_and_reserve_stock(line.product_id, line.quantity)
            .await?;
        reserved[idx] = Some(reservation);
    }
    let reservations: Vec<StockReservation> = reserved
        .into_iter()
        .map(|r| r.ok_or_else(|| DomainError::internal("stock reservation missing")))
        .collect::<DomainResult<_>>()?;

    let sale_id = SaleId::new();
    let items: Vec<SaleItem> = reservations
        .iter()
        .map(|r| {
            Ok(SaleItem {
                id: SaleItemId::new(),
                sale_id,
                product_id: r.product.id,
                product_name: r.product.name.clone(),
                quantity: r.quantity,
                unit_price: r.product.unit_price,
                total_price: money::line_total(r.quantity, r.product.unit_price)?,
                created_at: now,
            })
        })
        .collect::<DomainResult<_>>()?;
    let total_amount = money::sum_amounts(items.iter().map(|i| i.total_price))?;

    let sale = Sale {
        id: sale_id,
        invoice_number,
        user_id,
        total_amount,
        status: SaleStatus::Completed,
        created_at: now,
        updated_at: now,
        items,
    };
    uow.save_sale(&sale).await?;

    Ok((sale, reservations))
}

async fn apply_status(
    uow: &mut dyn SaleUnitOfWork,
    actor: Option<&Principal>,
    id: SaleId,
    new_status: SaleStatus,
    now: DateTime<Utc>,
) -> DomainResult<(Sale, SaleStatus, Restoration)> {
    let mut sale = uow
        .load_sale_for_update(id)
        .await?
        .ok_or_else(|| DomainError::not_found("sale"))?;
    if let Some(actor) = actor {
        authorize_self_or(actor, sale.user_id, &Permission::SALES_READ_ALL)?;
    }
    let previous = sale.status;

    uow.set_sale_status(id, new_status, now).await?;

    let mut restoration = Restoration {
        restored: Vec::new(),
        skipped: Vec::new(),
    };
    if previous.transition_effect(new_status) == TransitionEffect::RestoreStock {
        let mut items: Vec<&SaleItem> = sale.items.iter().collect();
        items.sort_by_key(|i| i.product_id);
        for item in items {
            match uow.adjust_stock(item.product_id, item.quantity).await {
                Ok(change) => restoration.restored.push((item.quantity, change)),
                Err(DomainError::NotFound(what)) => {
                    warn!(
                        sale_id = %id,
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        "stock not restored: {what} not found"
                    );
                    restoration
                        .skipped
                        .push((item.product_id, item.quantity, format!("{what} not found")));
                }
                Err(e) => return Err(e),
            }
        }
    }

    sale.status = new_status;
    sale.updated_at = now;
    Ok((sale, previous, restoration))
}

async fn discard(uow: Box<dyn SaleUnitOfWork>) {
    if let Err(e) = uow.rollback().await {
        warn!(error = %e, "rollback failed; transaction will be dropped");
    }
}
