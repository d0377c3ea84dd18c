use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::UserId;

use crate::app::dto::{ApiQuery, CreateUserRequest, PageQuery, UpdateUserRequest, ValidatedJson};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Self-or-admin account routes.
pub fn router() -> Router {
    Router::new().route("/:id", get(get_user).put(update_user))
}

pub fn admin_router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", delete(delete_user))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: UserId = id.parse()?;
    let user = services.users.get(principal.principal(), id).await?;
    Ok(Json(user).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUserRequest>,
) -> ApiResult {
    let id: UserId = id.parse()?;
    let user = services
        .users
        .update(principal.principal(), id, body.into(), Utc::now())
        .await?;
    Ok(Json(user).into_response())
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    let page = services
        .users
        .list(principal.principal(), query.page_request()?)
        .await?;
    Ok(Json(page).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> ApiResult {
    let user = services
        .users
        .create(principal.principal(), body.into(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: UserId = id.parse()?;
    services
        .users
        .delete(principal.principal(), id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
