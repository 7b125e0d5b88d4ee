//! Process and host introspection.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::{HealthError, Result};

/// Memory counters of the current process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Resident set size.
    pub rss: u64,
    /// Virtual memory size.
    #[serde(rename = "virtual")]
    pub virtual_memory: u64,
}

/// Read access to the counters reported by the health endpoint.
pub trait ProcessMetrics: Send + Sync {
    /// Seconds since the process started.
    fn uptime(&self) -> Result<f64>;

    /// Memory counters of the current process.
    fn memory_usage(&self) -> Result<MemoryUsage>;

    /// Memory available to new allocations on the host, in bytes.
    fn free_memory(&self) -> Result<u64>;
}

impl<T: ProcessMetrics + ?Sized> ProcessMetrics for Arc<T> {
    fn uptime(&self) -> Result<f64> {
        (**self).uptime()
    }

    fn memory_usage(&self) -> Result<MemoryUsage> {
        (**self).memory_usage()
    }

    fn free_memory(&self) -> Result<u64> {
        (**self).free_memory()
    }
}

/// `ProcessMetrics` backed by the host operating system.
///
/// Uptime is measured from construction, so build this once at startup.
/// Every read refreshes a fresh `System`; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct SystemProcessMetrics {
    started_at: Instant,
}

impl SystemProcessMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// Creates metrics that measure uptime from `started_at`.
    pub fn started_at(started_at: Instant) -> Self {
        Self { started_at }
    }
}

impl Default for SystemProcessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMetrics for SystemProcessMetrics {
    fn uptime(&self) -> Result<f64> {
        Ok(self.started_at.elapsed().as_secs_f64())
    }

    fn memory_usage(&self) -> Result<MemoryUsage> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| HealthError::ProcessMetrics(e.to_string()))?;

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let process = system.process(pid).ok_or_else(|| {
            HealthError::ProcessMetrics(format!("process {pid} not found"))
        })?;

        Ok(MemoryUsage {
            rss: process.memory(),
            virtual_memory: process.virtual_memory(),
        })
    }

    fn free_memory(&self) -> Result<u64> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(HealthError::ProcessMetrics(
                "host memory introspection is not supported on this platform".to_string(),
            ));
        }
        let mut system = System::new();
        system.refresh_memory();
        // Counts reclaimable cache as free, like MemAvailable on Linux.
        Ok(system.available_memory())
    }
}
