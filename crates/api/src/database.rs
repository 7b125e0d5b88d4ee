//! Postgres connection monitoring.
//!
//! The health endpoint never touches the database itself. Instead a
//! background task probes the pool on an interval and records the outcome
//! in a [`ConnectionTracker`], which the reporter reads per request.

use std::sync::Arc;
use std::time::Duration;

use health::{ConnectionState, ConnectionStateProvider, ConnectionTracker};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Drives a `ConnectionTracker` from periodic probes of a Postgres pool.
#[derive(Debug)]
pub struct DatabaseMonitor {
    pool: PgPool,
    tracker: ConnectionTracker,
    ping_timeout: Duration,
}

impl DatabaseMonitor {
    /// Creates a monitor over an existing pool.
    pub fn new(pool: PgPool, tracker: ConnectionTracker, ping_timeout: Duration) -> Self {
        Self {
            pool,
            tracker,
            ping_timeout,
        }
    }

    /// Creates a lazily connected pool for `url` and marks the tracker
    /// `Connecting`. No connection is opened until the first probe.
    pub fn connect_lazy(
        url: &str,
        tracker: ConnectionTracker,
        ping_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(ping_timeout)
            .connect_lazy(url)?;
        tracker.set_state(ConnectionState::Connecting);
        Ok(Self::new(pool, tracker, ping_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Probes the database once and records the resulting state.
    ///
    /// While a probe from a non-connected state is in flight the tracker
    /// reads `Connecting`.
    pub async fn ping(&self) -> ConnectionState {
        let previous = self
            .tracker
            .connection_state()
            .unwrap_or(ConnectionState::Unknown);

        if self.pool.is_closed() {
            self.record(previous, ConnectionState::Disconnected);
            return ConnectionState::Disconnected;
        }

        if !previous.is_connected() {
            self.tracker.set_state(ConnectionState::Connecting);
        }

        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        let next = match tokio::time::timeout(self.ping_timeout, probe).await {
            Ok(Ok(_)) => ConnectionState::Connected,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "database ping failed");
                ConnectionState::Disconnected
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.ping_timeout.as_millis() as u64,
                    "database ping timed out"
                );
                ConnectionState::Disconnected
            }
        };

        self.record(previous, next);
        next
    }

    /// Probes every `interval` until the returned task is aborted.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.ping().await;
            }
        })
    }

    /// Closes the pool, passing through `Disconnecting`.
    pub async fn close(&self) {
        self.tracker.set_state(ConnectionState::Disconnecting);
        self.pool.close().await;
        self.tracker.set_state(ConnectionState::Disconnected);
        tracing::info!("database connection closed");
    }

    fn record(&self, previous: ConnectionState, next: ConnectionState) {
        self.tracker.set_state(next);
        metrics::counter!("database_pings_total", "state" => next.as_str()).increment(1);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "database connection state changed");
        }
    }
}
