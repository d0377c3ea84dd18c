//! Admin-only routes. Mounted behind `require_admin`.

use axum::{routing::get, Router};

use super::{categories, products, reports, sales, shelves, users, warehouses};

pub fn router() -> Router {
    Router::new()
        .nest("/users", users::admin_router())
        .nest("/warehouses", warehouses::admin_router())
        .nest("/categories", categories::admin_router())
        .nest("/shelves", shelves::admin_router())
        .nest("/products", products::admin_router())
        .route("/sales", get(sales::list_all_sales))
        .route("/sales/report", get(reports::sales_report))
        .nest("/reports", reports::router())
}
