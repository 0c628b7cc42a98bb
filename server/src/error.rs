//! Maps every port's error taxonomy onto HTTP responses (spec §7).
//!
//! Mirrors the teacher's `routers::error` helpers: a single JSON error shape
//! with a machine-readable `code` plus an `X-Error-Code` header, at the
//! status that best fits each error kind.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const HEADER_ERROR_CODE: &str = "X-Error-Code";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::with_capacity(1);
        if let Ok(val) = HeaderValue::from_str(self.code) {
            headers.insert(HEADER_ERROR_CODE, val);
        }
        (
            self.status,
            headers,
            Json(ErrorBody {
                error: ErrorDetail {
                    code: self.code,
                    message: self.message,
                },
            }),
        )
            .into_response()
    }
}

impl From<conduit_persistence::PersistenceError> for AppError {
    fn from(e: conduit_persistence::PersistenceError) -> Self {
        use conduit_persistence::PersistenceError as P;
        match &e {
            P::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", e.to_string()),
            P::OptimisticConflict(_) => Self::new(StatusCode::CONFLICT, "optimistic_conflict", e.to_string()),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "persistence_error", e.to_string()),
        }
    }
}

impl From<conduit_mcp::McpError> for AppError {
    fn from(e: conduit_mcp::McpError) -> Self {
        use conduit_mcp::McpError as M;
        let status = match &e {
            M::NotFound(_) | M::ToolNotFound(_) => StatusCode::NOT_FOUND,
            M::InvalidArguments(_) | M::Config(_) => StatusCode::BAD_REQUEST,
            M::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            M::Transport(_) | M::NotConnected(_) | M::Io(_) | M::Http(_) | M::Sdk(_) => StatusCode::BAD_GATEWAY,
            M::Protocol(_) | M::ToolError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, e.as_code(), e.to_string())
    }
}

impl From<conduit_secrets::SecretError> for AppError {
    fn from(e: conduit_secrets::SecretError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "secret_error", e.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string())
    }
}
