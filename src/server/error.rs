//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    /// Feature switched off by configuration
    Unavailable(String),
    /// Feed or translation endpoint failure
    Upstream(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "missing or invalid bearer token"),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ApiError::new("CONFLICT", msg)),
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, ApiError::new("UNAVAILABLE", msg))
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, ApiError::new("UPSTREAM_ERROR", msg))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ApiError::new("INTERNAL_ERROR", msg))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<crate::Error> for AppError {
    fn from(err: crate::Error) -> Self {
        use crate::Error;

        if err.is_constraint_violation() {
            return AppError::Conflict(err.to_string());
        }
        match err {
            Error::Validation(msg) | Error::InvalidValue(msg) | Error::InvalidPath(msg) => {
                AppError::BadRequest(msg)
            }
            Error::Json(e) => AppError::BadRequest(e.to_string()),
            Error::NotFound(msg) => AppError::NotFound(msg),
            Error::Unauthorized => AppError::Unauthorized,
            Error::Feed(msg) | Error::Translation(msg) => AppError::Upstream(msg),
            Error::Http(e) => AppError::Upstream(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (crate::Error::Validation("x".into()), StatusCode::BAD_REQUEST),
            (crate::Error::InvalidPath("..".into()), StatusCode::BAD_REQUEST),
            (crate::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (crate::Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (crate::Error::Feed("down".into()), StatusCode::BAD_GATEWAY),
            (crate::Error::Io(std::io::Error::other("disk")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
