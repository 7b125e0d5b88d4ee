//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::database::DatabaseMonitor;
use health::{ConnectionTracker, HealthReporter, SystemProcessMetrics};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Start the uptime clock before anything else
    let process = SystemProcessMetrics::new();

    // 2. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 4. Start monitoring the database, if one is configured
    let tracker = ConnectionTracker::new();
    let monitor = match config.database_url.as_deref() {
        Some(url) => {
            match DatabaseMonitor::connect_lazy(url, tracker.clone(), config.db_ping_timeout) {
                Ok(monitor) => Some(Arc::new(monitor)),
                Err(err) => {
                    tracing::error!(error = %err, "invalid DATABASE_URL, database monitoring disabled");
                    None
                }
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set, health will report degraded");
            None
        }
    };
    let ping_task = monitor
        .as_ref()
        .map(|monitor| monitor.spawn(config.db_ping_interval));

    // 5. Build the application
    let reporter = Arc::new(HealthReporter::new(
        tracker,
        process,
        config.reporter_options(),
    ));
    let app = api::create_app(reporter, metrics_handle, &config);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(
        %addr,
        environment = config.environment.as_str(),
        "starting API server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Stop probing and release the pool
    if let Some(task) = ping_task {
        task.abort();
    }
    if let Some(monitor) = monitor {
        monitor.close().await;
    }

    tracing::info!("server shut down gracefully");
}
