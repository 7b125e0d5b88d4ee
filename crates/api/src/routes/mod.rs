//! HTTP route handlers.

pub mod health;
pub mod metrics;

use axum::http::Uri;

use crate::error::ApiError;

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Not Found - {uri}"))
}
