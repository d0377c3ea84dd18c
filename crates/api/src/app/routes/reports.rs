use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};

use crate::app::dto::{ApiQuery, ProductReportQuery, ReportQuery};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(product_report))
        .route("/sales", get(sales_report))
        .route("/revenue", get(revenue_report))
}

pub async fn sales_report(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult {
    let report = services
        .reports
        .get_sales_report(&query.start_date, &query.end_date)
        .await?;
    Ok(Json(report).into_response())
}

/// `group_by=day|month` adds a breakdown; anything else returns the summary.
pub async fn revenue_report(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult {
    let report = services
        .reports
        .get_revenue_report(&query.start_date, &query.end_date, &query.group_by)
        .await?;
    Ok(Json(report).into_response())
}

pub async fn product_report(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<ProductReportQuery>,
) -> ApiResult {
    let report = services.reports.get_product_report(query.into()).await?;
    Ok(Json(report).into_response())
}
