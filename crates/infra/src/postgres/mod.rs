//! Postgres-backed store.
//!
//! One `PostgresStore` implements every storage port over a shared pool.
//! Sale writes run inside `PgUnitOfWork`, a thin wrapper over an SQLx
//! transaction; product rows touched by a sale are locked with
//! `SELECT ... FOR UPDATE` in the order the workflow asks for them.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | DomainError |
//! |------------|-----------------|-------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `InvalidRequest` |
//! | Database (check violation) | `23514` | `InvalidRequest` |
//! | Anything else | | `Internal` |

mod accounts;
mod catalog;
mod reports;
mod sales;

use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::{error, info, instrument};

use stockroom_core::{DomainError, DomainResult};

pub use sales::PgUnitOfWork;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema. Safe to run on every start.
    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        info!("database schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Read one column, mapping decode failures to `Internal`.
fn col<'r, T>(row: &'r PgRow, column: &str) -> DomainResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| DomainError::internal(format!("failed to decode column {column}: {e}")))
}

/// `LIMIT` / `OFFSET` bind values for a page.
fn limit_offset(page: stockroom_core::PageRequest) -> (i64, i64) {
    (
        i64::from(page.limit()),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

/// Constraint violations become client errors; anything else is logged here
/// and surfaces as `Internal` naming only the operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => {
                DomainError::Conflict(format!("duplicate value rejected in {operation}"))
            }
            Some("23503") => {
                DomainError::InvalidRequest(format!("referenced record missing in {operation}"))
            }
            Some("23514") | Some("22003") => {
                DomainError::InvalidRequest(format!("value out of range in {operation}"))
            }
            _ => {
                error!(operation, error = %db_err, "database error");
                DomainError::internal(format!("database error in {operation}"))
            }
        },
        sqlx::Error::PoolClosed => {
            error!(operation, "connection pool closed");
            DomainError::internal(format!("connection pool closed in {operation}"))
        }
        other => {
            error!(operation, error = %other, "sqlx error");
            DomainError::internal(format!("storage failure in {operation}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_internal() {
        let err = map_sqlx_error("list_users", sqlx::Error::PoolClosed);
        assert_eq!(err.code(), "internal_error");
        assert!(err.to_string().contains("list_users"));
    }

    #[test]
    fn row_not_found_is_internal() {
        let err = map_sqlx_error("get_product", sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn schema_declares_stock_floor_and_unique_invoice() {
        assert!(SCHEMA.contains("CHECK (stock_quantity >= 0)"));
        assert!(SCHEMA.contains("invoice_number VARCHAR(32)    NOT NULL UNIQUE"));
    }
}
