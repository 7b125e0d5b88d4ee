//! Health payloads served by the health endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConnectionState, MemoryUsage};

/// Overall service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service and data store are available.
    Healthy,
    /// Service is reachable but the data store is not connected.
    Degraded,
    /// The report itself could not be produced.
    Error,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Error => "error",
        }
    }
}

/// Data store section of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: ConnectionState,
    pub connected: bool,
}

impl From<ConnectionState> for DatabaseHealth {
    fn from(state: ConnectionState) -> Self {
        Self {
            status: state,
            connected: state.is_connected(),
        }
    }
}

/// Memory section of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub usage: MemoryUsage,
    /// Free host memory in bytes; omitted from the payload when not collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<u64>,
}

/// A successful health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    /// Seconds since process start.
    pub uptime: f64,
    pub database: DatabaseHealth,
    pub memory: MemoryReport,
}

impl HealthReport {
    /// Builds a report, deriving the overall status from the store state.
    pub fn new(
        timestamp: DateTime<Utc>,
        uptime: f64,
        connection: ConnectionState,
        memory: MemoryReport,
    ) -> Self {
        let status = if connection.is_connected() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            timestamp: iso_timestamp(timestamp),
            uptime,
            database: DatabaseHealth::from(connection),
            memory,
        }
    }
}

/// Payload returned when a report could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub status: HealthStatus,
    pub timestamp: String,
    pub error: String,
}

impl FailureReport {
    pub fn new(timestamp: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            timestamp: iso_timestamp(timestamp),
            error: error.into(),
        }
    }
}

/// Outcome of a health check: a report, or the failure that prevented one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HealthResponse {
    Report(HealthReport),
    Failure(FailureReport),
}

impl HealthResponse {
    pub fn status(&self) -> HealthStatus {
        match self {
            Self::Report(report) => report.status,
            Self::Failure(failure) => failure.status,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Formats a timestamp as ISO-8601 UTC with millisecond precision,
/// e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
