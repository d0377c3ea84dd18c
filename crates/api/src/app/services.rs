//! Service wiring: one store backend behind every port.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use stockroom_auth::{AuthService, SessionStore, UserService, UserStore};
use stockroom_core::{AuditSink, DomainResult};
use stockroom_infra::{InMemoryStore, PostgresStore};
use stockroom_inventory::{CatalogStore, InventoryService};
use stockroom_observability::TracingAuditSink;
use stockroom_reports::{ReportSource, ReportingAggregator};
use stockroom_sales::{RandomInvoiceNumbers, SaleStore, SaleWorkflow};

use crate::config::AppConfig;

const BOOTSTRAP_USERNAME: &str = "superadmin";

pub struct AppServices {
    pub auth: AuthService,
    pub users: UserService,
    pub inventory: InventoryService,
    pub sales: SaleWorkflow,
    pub reports: ReportingAggregator,
}

impl AppServices {
    /// Wire every service to a single store implementing all ports.
    pub fn with_store<S>(store: Arc<S>, session_ttl: Duration, audit: Arc<dyn AuditSink>) -> Self
    where
        S: UserStore + SessionStore + CatalogStore + SaleStore + ReportSource + 'static,
    {
        Self {
            auth: AuthService::new(store.clone(), store.clone(), session_ttl),
            users: UserService::new(store.clone(), store.clone()),
            inventory: InventoryService::new(store.clone(), audit.clone()),
            sales: SaleWorkflow::new(store.clone(), Arc::new(RandomInvoiceNumbers), audit),
            reports: ReportingAggregator::new(store),
        }
    }

    pub fn in_memory(session_ttl: Duration) -> Self {
        Self::with_store(
            Arc::new(InMemoryStore::new()),
            session_ttl,
            Arc::new(TracingAuditSink),
        )
    }

    /// Connect, apply the schema and wire the Postgres store.
    pub async fn postgres(
        database_url: &str,
        max_connections: u32,
        session_ttl: Duration,
    ) -> DomainResult<Self> {
        let store = PostgresStore::connect(database_url, max_connections).await?;
        store.ensure_schema().await?;
        Ok(Self::with_store(
            Arc::new(store),
            session_ttl,
            Arc::new(TracingAuditSink),
        ))
    }

    /// Postgres when `database_url` is set, otherwise in-memory.
    pub async fn from_config(cfg: &AppConfig) -> DomainResult<Self> {
        match &cfg.database_url {
            Some(url) => {
                info!(max_connections = cfg.db_max_connections, "using postgres store");
                Self::postgres(url, cfg.db_max_connections, cfg.session_ttl()).await
            }
            None => {
                info!("no database_url configured; using in-memory store");
                Ok(Self::in_memory(cfg.session_ttl()))
            }
        }
    }

    /// Create the configured super admin unless that email already exists.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> DomainResult<()> {
        match self
            .users
            .bootstrap_super_admin(BOOTSTRAP_USERNAME, email, password, Utc::now())
            .await?
        {
            Some(user) => info!(user_id = %user.id, "super admin created"),
            None => info!("super admin already present; skipping bootstrap"),
        }
        Ok(())
    }
}
