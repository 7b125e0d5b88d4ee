use thiserror::Error;

/// Errors raised while assembling a health report.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The persistence layer's connection state could not be read.
    #[error("Connection state unavailable: {0}")]
    ConnectionState(String),

    /// Process or host counters could not be read.
    #[error("Process metrics unavailable: {0}")]
    ProcessMetrics(String),
}

/// Result type for health reporting operations.
pub type Result<T> = std::result::Result<T, HealthError>;
