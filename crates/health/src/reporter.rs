use chrono::Utc;

use crate::{
    ConnectionStateProvider, FailureReport, HealthReport, HealthResponse, MemoryReport,
    ProcessMetrics, Result,
};

/// Options controlling what a report contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterOptions {
    /// Include free host memory (`memory.free`). Intended for development
    /// deployments only.
    pub include_free_memory: bool,
}

impl ReporterOptions {
    pub fn with_free_memory(include_free_memory: bool) -> Self {
        Self {
            include_free_memory,
        }
    }
}

/// Assembles health reports from the store state and process counters.
///
/// Holds no mutable state: every call reads its collaborators afresh, so a
/// shared reporter may serve concurrent requests.
#[derive(Debug)]
pub struct HealthReporter<C, P> {
    connection: C,
    process: P,
    options: ReporterOptions,
}

impl<C, P> HealthReporter<C, P>
where
    C: ConnectionStateProvider,
    P: ProcessMetrics,
{
    pub fn new(connection: C, process: P, options: ReporterOptions) -> Self {
        Self {
            connection,
            process,
            options,
        }
    }

    pub fn options(&self) -> ReporterOptions {
        self.options
    }

    /// Builds a report, failing if any collaborator read fails.
    pub fn report(&self) -> Result<HealthReport> {
        let state = self.connection.connection_state()?;
        let uptime = self.process.uptime()?;
        let usage = self.process.memory_usage()?;
        let free = if self.options.include_free_memory {
            Some(self.process.free_memory()?)
        } else {
            None
        };

        Ok(HealthReport::new(
            Utc::now(),
            uptime,
            state,
            MemoryReport { usage, free },
        ))
    }

    /// Builds a report, turning any failure into a `FailureReport`.
    pub fn get_health(&self) -> HealthResponse {
        match self.report() {
            Ok(report) => {
                tracing::debug!(
                    status = report.status.as_str(),
                    database = %report.database.status,
                    "health report assembled"
                );
                HealthResponse::Report(report)
            }
            Err(err) => {
                tracing::error!(error = %err, "health report failed");
                HealthResponse::Failure(FailureReport::new(Utc::now(), err.to_string()))
            }
        }
    }
}
