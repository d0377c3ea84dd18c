use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::{CategoryId, ProductId, ShelfId};
use stockroom_inventory::{NewProduct, ProductChanges};

use crate::app::dto::{
    self, ApiJson, ApiQuery, PageQuery, ProductListQuery, ProductResponse, StockUpdateResponse,
    UpdateStockRequest, ValidatedJson,
};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/low-stock", get(list_low_stock))
        .route("/category/:category_id", get(list_by_category))
        .route("/shelf/:shelf_id", get(list_by_shelf))
        .route("/:id", get(get_product))
        .route("/:id/stock", put(update_stock))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> ApiResult {
    let page = services
        .inventory
        .list_products(query.filter(), query.page_request()?)
        .await?;
    Ok(Json(dto::product_page(page)).into_response())
}

pub async fn list_low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .inventory
        .list_low_stock(query.page_request()?)
        .await?;
    Ok(Json(dto::product_page(page)).into_response())
}

pub async fn list_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let category_id: CategoryId = category_id.parse()?;
    let page = services
        .inventory
        .list_products_by_category(category_id, query.page_request()?)
        .await?;
    Ok(Json(dto::product_page(page)).into_response())
}

pub async fn list_by_shelf(
    Extension(services): Extension<Arc<AppServices>>,
    Path(shelf_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let shelf_id: ShelfId = shelf_id.parse()?;
    let page = services
        .inventory
        .list_products_by_shelf(shelf_id, query.page_request()?)
        .await?;
    Ok(Json(dto::product_page(page)).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = id.parse()?;
    let product = services.inventory.get_product(id).await?;
    Ok(Json(ProductResponse::from(product)).into_response())
}

/// Set the absolute on-hand quantity. Open to every authenticated user.
pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateStockRequest>,
) -> ApiResult {
    let id: ProductId = id.parse()?;
    let change = services
        .inventory
        .update_stock(principal.principal(), id, body.quantity, body.notes, Utc::now())
        .await?;
    Ok(Json(StockUpdateResponse::from(change)).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewProduct>,
) -> ApiResult {
    let product = services
        .inventory
        .create_product(principal.principal(), body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductChanges>,
) -> ApiResult {
    let id: ProductId = id.parse()?;
    let product = services
        .inventory
        .update_product(principal.principal(), id, body, Utc::now())
        .await?;
    Ok(Json(ProductResponse::from(product)).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = id.parse()?;
    services
        .inventory
        .delete_product(principal.principal(), id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
