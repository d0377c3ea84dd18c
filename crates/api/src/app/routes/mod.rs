use axum::{middleware, Router};

pub mod admin;
pub mod auth;
pub mod categories;
pub mod products;
pub mod reports;
pub mod sales;
pub mod shelves;
pub mod system;
pub mod users;
pub mod warehouses;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/warehouses", warehouses::router())
        .nest("/categories", categories::router())
        .nest("/shelves", shelves::router())
        .nest("/products", products::router())
        .nest("/sales", sales::router())
        .nest(
            "/admin",
            admin::router().layer(middleware::from_fn(crate::middleware::require_admin)),
        )
}
