//! Health reporting for the backend service.
//!
//! This crate provides:
//! - `HealthReport` and the failure payload returned by the health endpoint
//! - `ConnectionStateProvider` for the persistence layer's connection state
//! - `ProcessMetrics` for uptime and memory counters of the host process
//! - `HealthReporter`, which assembles a report per request

pub mod error;
pub mod process;
pub mod report;
pub mod reporter;
pub mod state;

pub use error::{HealthError, Result};
pub use process::{MemoryUsage, ProcessMetrics, SystemProcessMetrics};
pub use report::{
    DatabaseHealth, FailureReport, HealthReport, HealthResponse, HealthStatus, MemoryReport,
    iso_timestamp,
};
pub use reporter::{HealthReporter, ReporterOptions};
pub use state::{ConnectionState, ConnectionStateProvider, ConnectionTracker};
