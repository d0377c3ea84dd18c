use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::CategoryId;
use stockroom_inventory::{CategoryChanges, NewCategory};

use crate::app::dto::{ApiJson, ApiQuery, PageQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories))
        .route("/:id", get(get_category))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/", post(create_category))
        .route("/:id", put(update_category).delete(delete_category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .inventory
        .list_categories(query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CategoryId = id.parse()?;
    Ok(Json(services.inventory.get_category(id).await?).into_response())
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewCategory>,
) -> ApiResult {
    let category = services
        .inventory
        .create_category(principal.principal(), body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CategoryChanges>,
) -> ApiResult {
    let id: CategoryId = id.parse()?;
    let category = services
        .inventory
        .update_category(principal.principal(), id, body, Utc::now())
        .await?;
    Ok(Json(category).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CategoryId = id.parse()?;
    services
        .inventory
        .delete_category(principal.principal(), id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
