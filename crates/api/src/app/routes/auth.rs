use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use crate::app::dto::{LoginRequest, LoginResponse, ValidatedJson};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Authenticated auth routes; `login` is mounted publicly by `build_app`.
pub fn router() -> Router {
    Router::new().route("/logout", post(logout))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult {
    let outcome = services
        .auth
        .login(&body.email, &body.password, Utc::now())
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.session.token.to_string(),
        expires_at: outcome.session.expires_at,
        user: outcome.user,
    })
    .into_response())
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    services.auth.logout(principal.token(), Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
