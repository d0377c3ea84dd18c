use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use stockroom_core::{DomainError, DomainResult, PageRequest, ProductId, SaleId, SoftDelete, UserId};
use stockroom_inventory::product::{adjust_floor, deduct_floor};
use stockroom_inventory::{StockChange, StockLedger, StockReservation};
use stockroom_sales::{Sale, SaleRecorder, SaleStatus, SaleStore, SaleUnitOfWork};

use super::{InMemoryStore, Tables, paginate};

/// Holds the store lock and a staged copy of every table until it ends.
pub struct InMemoryUnitOfWork {
    live: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl StockLedger for InMemoryUnitOfWork {
    async fn check_and_reserve_stock(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> DomainResult<StockReservation> {
        let product = self
            .staged
            .products
            .get_mut(&product_id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

        if product.stock_quantity < quantity {
            return Err(DomainError::InsufficientStock {
                product_id,
                product_name: product.name.clone(),
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        let snapshot = product.clone();
        let old_stock = product.stock_quantity;
        product.stock_quantity = deduct_floor(old_stock, quantity);
        product.updated_at = Utc::now();

        Ok(StockReservation {
            product: snapshot,
            quantity,
            change: StockChange {
                product_id,
                old_stock,
                new_stock: product.stock_quantity,
            },
        })
    }

    async fn adjust_stock(&mut self, product_id: ProductId, delta: i32) -> DomainResult<StockChange> {
        let product = self
            .staged
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        let old_stock = product.stock_quantity;
        product.stock_quantity = adjust_floor(old_stock, delta);
        product.updated_at = Utc::now();
        Ok(StockChange {
            product_id,
            old_stock,
            new_stock: product.stock_quantity,
        })
    }
}

#[async_trait]
impl SaleRecorder for InMemoryUnitOfWork {
    async fn save_sale(&mut self, sale: &Sale) -> DomainResult<()> {
        let taken = self
            .staged
            .sales
            .values()
            .any(|s| s.invoice_number == sale.invoice_number);
        if taken {
            return Err(DomainError::conflict(format!(
                "invoice number {} already used",
                sale.invoice_number
            )));
        }
        if self.staged.sales.contains_key(&sale.id) {
            return Err(DomainError::conflict("sale already exists"));
        }
        self.staged.sales.insert(sale.id, sale.clone());
        Ok(())
    }

    async fn load_sale_for_update(&mut self, id: SaleId) -> DomainResult<Option<Sale>> {
        Ok(self.staged.sales.get(&id).cloned())
    }

    async fn set_sale_status(
        &mut self,
        id: SaleId,
        status: SaleStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let sale = self
            .staged
            .sales
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("sale"))?;
        sale.status = status;
        sale.updated_at = at;
        Ok(())
    }
}

#[async_trait]
impl SaleUnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let Self { mut live, staged } = *self;
        *live = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SaleStore for InMemoryStore {
    async fn begin(&self) -> DomainResult<Box<dyn SaleUnitOfWork>> {
        let live = self.tables.clone().lock_owned().await;
        let staged = (*live).clone();
        Ok(Box::new(InMemoryUnitOfWork { live, staged }))
    }

    async fn load_sale(&self, id: SaleId) -> DomainResult<Option<Sale>> {
        Ok(self.tables.lock().await.sales.get(&id).cloned())
    }

    async fn list_sales(
        &self,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> DomainResult<(Vec<Sale>, u64)> {
        let t = self.tables.lock().await;
        let rows = t
            .sales
            .values()
            .filter(|s| owner.is_none_or(|u| s.user_id == u))
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }
}
