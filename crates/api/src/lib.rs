//! HTTP API server exposing service health.
//!
//! Serves `GET /api/health` and Prometheus metrics, with structured logging
//! (tracing) and a Postgres connection monitor feeding the health report.

pub mod config;
pub mod database;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use health::{ConnectionStateProvider, HealthReporter, ProcessMetrics};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, P>(
    reporter: Arc<HealthReporter<C, P>>,
    metrics_handle: PrometheusHandle,
    config: &Config,
) -> Router
where
    C: ConnectionStateProvider + 'static,
    P: ProcessMetrics + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/api/health", get(routes::health::check::<C, P>))
        .with_state(reporter)
        .merge(metrics_router)
        .fallback(routes::not_found)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}

/// Builds the CORS policy.
///
/// With an explicit origin, browsers may send credentials (cookies) to the
/// API. Without one, any origin is allowed but credentials are not.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let origin = origin.and_then(|origin| match HeaderValue::from_str(origin) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(%origin, error = %err, "ignoring invalid CORS origin");
            None
        }
    });

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(AllowHeaders::mirror_request()),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
