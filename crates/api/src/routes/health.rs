//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use health::{ConnectionStateProvider, HealthReporter, HealthResponse, ProcessMetrics};

/// GET /api/health — reports uptime, database connectivity and memory usage.
///
/// A degraded report is still a 200; only a failure to build the report
/// yields a 500.
#[tracing::instrument(skip(reporter))]
pub async fn check<C, P>(State(reporter): State<Arc<HealthReporter<C, P>>>) -> Response
where
    C: ConnectionStateProvider + 'static,
    P: ProcessMetrics + 'static,
{
    let response = reporter.get_health();
    metrics::counter!("health_checks_total", "status" => response.status().as_str())
        .increment(1);

    let code = match &response {
        HealthResponse::Report(_) => StatusCode::OK,
        HealthResponse::Failure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(response)).into_response()
}
