use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::WarehouseId;
use stockroom_inventory::{NewWarehouse, WarehouseChanges};

use crate::app::dto::{ApiJson, ApiQuery, PageQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses))
        .route("/:id", get(get_warehouse))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/", post(create_warehouse))
        .route("/:id", put(update_warehouse).delete(delete_warehouse))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .inventory
        .list_warehouses(query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: WarehouseId = id.parse()?;
    Ok(Json(services.inventory.get_warehouse(id).await?).into_response())
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewWarehouse>,
) -> ApiResult {
    let warehouse = services
        .inventory
        .create_warehouse(principal.principal(), body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)).into_response())
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<WarehouseChanges>,
) -> ApiResult {
    let id: WarehouseId = id.parse()?;
    let warehouse = services
        .inventory
        .update_warehouse(principal.principal(), id, body, Utc::now())
        .await?;
    Ok(Json(warehouse).into_response())
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: WarehouseId = id.parse()?;
    services
        .inventory
        .delete_warehouse(principal.principal(), id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
