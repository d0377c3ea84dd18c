use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockroom_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Internal(detail) => {
            tracing::error!(%detail, "request failed with internal error");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.code(),
                "internal server error",
            );
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Handler error: any domain failure, rendered through
/// [`domain_error_to_response`].
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        domain_error_to_response(self.0)
    }
}

pub type ApiResult<T = Response> = Result<T, ApiError>;
