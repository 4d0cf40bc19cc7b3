//! Bearer token checks for cron and admin endpoints

use super::error::AppError;
use super::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Compare through blake3 digests; `Hash` equality is constant time
pub fn tokens_match(given: &str, expected: &str) -> bool {
    blake3::hash(given.as_bytes()) == blake3::hash(expected.as_bytes())
}

/// Cron endpoints refuse to run at all without a configured secret
pub fn authorize_cron(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AppError> {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return Err(AppError::Unavailable("cron secret is not configured".to_string()));
    };
    match bearer_token(headers) {
        Some(token) if tokens_match(token, secret) => Ok(()),
        _ => {
            tracing::warn!("Rejected cron request with missing or invalid token");
            Err(AppError::Unauthorized)
        }
    }
}

/// Middleware for admin routes; open when no admin token is configured
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.admin_token.as_deref().filter(|t| !t.is_empty()) {
        match bearer_token(request.headers()) {
            Some(token) if tokens_match(token, expected) => {}
            _ => return Err(AppError::Unauthorized),
        }
    }
    Ok(next.run(request).await)
}
