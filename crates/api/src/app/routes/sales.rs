use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::SaleId;

use crate::app::dto::{ApiQuery, CreateSaleRequest, PageQuery, UpdateSaleStatusRequest, ValidatedJson};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/:id", get(get_sale))
        .route("/:id/status", put(update_status))
}

pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ValidatedJson(body): ValidatedJson<CreateSaleRequest>,
) -> ApiResult {
    let sale = services
        .sales
        .create_sale_for(principal.principal(), body.into_lines(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(sale)).into_response())
}

/// Staff see their own sales; admins see all of them.
pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .sales
        .list_sales_for(principal.principal(), query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

/// Every sale regardless of owner; mounted under `/admin`.
pub async fn list_all_sales(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .sales
        .list_sales(None, query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn get_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: SaleId = id.parse()?;
    let sale = services.sales.get_sale_for(principal.principal(), id).await?;
    Ok(Json(sale).into_response())
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateSaleStatusRequest>,
) -> ApiResult {
    let id: SaleId = id.parse()?;
    let sale = services
        .sales
        .update_sale_status_for(principal.principal(), id, &body.status, Utc::now())
        .await?;
    Ok(Json(sale).into_response())
}
