//! Result persistence.
//!
//! Sessions and benchmark reports are written as pretty-printed JSON so
//! runs can be diffed and post-processed outside the harness. Benchmark
//! reports carry a host snapshot for cross-machine comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use sysinfo::System;
use tracing::info;

use crate::benchmark::BenchmarkSession;
use crate::error::Result;
use crate::session::TestSession;

/// Host snapshot taken at report time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub cpu_count: usize,
    pub total_memory_mb: u64,
}

impl SystemInfo {
    pub fn capture() -> Self {
        let mut system = System::new_all();
        system.refresh_memory();
        Self {
            os: System::long_os_version().unwrap_or_else(|| "unknown".to_string()),
            cpu_count: system.cpus().len(),
            total_memory_mb: system.total_memory() / (1024 * 1024),
        }
    }
}

/// Top-level benchmark report, one per invocation.
#[derive(Debug, Serialize)]
pub struct BenchmarkReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
    pub scenarios: &'a BenchmarkSession,
}

/// Write a finished (or aborted) suite session as pretty JSON.
pub fn save_session(session: &TestSession, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(session)?)?;
    info!(path = %path.display(), "session saved");
    Ok(())
}

/// Write a benchmark session as a timestamped report with a host snapshot.
pub fn save_benchmark_report(session: &BenchmarkSession, path: &Path) -> Result<()> {
    let report = BenchmarkReport {
        timestamp: Utc::now(),
        system: SystemInfo::capture(),
        scenarios: session,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    info!(path = %path.display(), "benchmark report saved");
    Ok(())
}
