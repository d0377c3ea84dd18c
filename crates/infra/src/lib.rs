//! Storage adapters.
//!
//! `InMemoryStore` and `PostgresStore` each implement every storage port of
//! the domain crates (`UserStore`, `SessionStore`, `CatalogStore`,
//! `SaleStore` and `ReportSource`), so the service layer can be wired to
//! either one.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgUnitOfWork, PostgresStore};
