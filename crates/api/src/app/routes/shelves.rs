use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::{ShelfId, WarehouseId};
use stockroom_inventory::{NewShelf, ShelfChanges};

use crate::app::dto::{ApiJson, ApiQuery, PageQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_shelves))
        .route("/warehouse/:warehouse_id", get(list_warehouse_shelves))
        .route("/:id", get(get_shelf))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/", post(create_shelf))
        .route("/:id", put(update_shelf).delete(delete_shelf))
}

pub async fn list_shelves(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .inventory
        .list_shelves(None, query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn list_warehouse_shelves(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let warehouse_id: WarehouseId = warehouse_id.parse()?;
    let page = services
        .inventory
        .list_shelves(Some(warehouse_id), query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn get_shelf(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ShelfId = id.parse()?;
    Ok(Json(services.inventory.get_shelf(id).await?).into_response())
}

pub async fn create_shelf(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewShelf>,
) -> ApiResult {
    let shelf = services
        .inventory
        .create_shelf(principal.principal(), body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(shelf)).into_response())
}

pub async fn update_shelf(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ShelfChanges>,
) -> ApiResult {
    let id: ShelfId = id.parse()?;
    let shelf = services
        .inventory
        .update_shelf(principal.principal(), id, body, Utc::now())
        .await?;
    Ok(Json(shelf).into_response())
}

pub async fn delete_shelf(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ShelfId = id.parse()?;
    services
        .inventory
        .delete_shelf(principal.principal(), id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
