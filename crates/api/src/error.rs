//! API error types with HTTP response mapping.

use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use health::FailureReport;

/// API-level error type that maps to HTTP responses.
///
/// Bodies share the health failure shape:
/// `{"status": "error", "timestamp": ..., "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(FailureReport::new(Utc::now(), message))).into_response()
    }
}

/// Converts a handler panic into a 500 response carrying the panic message.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = err.downcast_ref::<&str>() {
        (*msg).to_string()
    } else {
        "request handler panicked".to_string()
    };

    ApiError::Internal(message).into_response()
}
