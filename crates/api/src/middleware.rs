use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

use stockroom_auth::{AuthService, SessionToken};

use crate::app::errors::{domain_error_to_response, json_error};
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
}

/// Resolve `Authorization: Bearer <token>` into a [`PrincipalContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let principal = state
        .auth
        .authenticate(token, Utc::now())
        .await
        .map_err(domain_error_to_response)?;

    req.extensions_mut()
        .insert(PrincipalContext::new(principal, token));

    Ok(next.run(req).await)
}

/// Admin-only guard; must run inside [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Response> {
    let principal = req
        .extensions()
        .get::<PrincipalContext>()
        .ok_or_else(|| unauthorized("authentication required"))?;

    if !principal.role().is_admin() {
        return Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin access required",
        ));
    }

    Ok(next.run(req).await)
}

pub async fn trace_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let res = next.run(req).await;

    info!(
        %method,
        %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    res
}

fn extract_bearer(headers: &HeaderMap) -> Result<SessionToken, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("missing bearer token"))?;

    let header = header
        .to_str()
        .map_err(|_| unauthorized("malformed authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("missing bearer token"))?
        .trim();
    if token.is_empty() {
        return Err(unauthorized("missing bearer token"));
    }

    token.parse().map_err(domain_error_to_response)
}

fn unauthorized(message: &'static str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn bearer_token_is_parsed() {
        let token = SessionToken::generate();
        let parsed = extract_bearer(&headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn malformed_headers_are_unauthorized() {
        for value in ["Basic abc", "Bearer ", "Bearer not-a-uuid"] {
            let res = extract_bearer(&headers(value)).unwrap_err();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{value}");
        }
        let res = extract_bearer(&HeaderMap::new()).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
