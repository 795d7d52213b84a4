//! Background resource sampler.
//!
//! A dedicated thread measures the current process's resident memory and
//! CPU usage on a fixed cadence and feeds the shared metrics accumulator,
//! decoupled from request execution. Stop is a channel-based cancellation
//! followed by a join, so no sample is recorded after `stop` returns; the
//! `Drop` impl is the backstop for workloads that error out mid-scenario.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tracing::{debug, warn};

use crate::metrics::PerformanceMetrics;

pub struct SystemMonitor {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SystemMonitor {
    /// Spawn the sampling thread. Samples land in `metrics` every
    /// `interval` until `stop` is called.
    pub fn start(metrics: Arc<PerformanceMetrics>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("agentmark-monitor".into())
            .spawn(move || {
                let Ok(pid) = sysinfo::get_current_pid() else {
                    warn!("cannot resolve current pid, resource sampling disabled");
                    return;
                };
                let refresh = ProcessRefreshKind::nothing().with_memory().with_cpu();
                let mut system =
                    System::new_with_specifics(RefreshKind::nothing().with_processes(refresh));

                loop {
                    // The stop channel doubles as the sampling cadence.
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    system.refresh_processes_specifics(
                        ProcessesToUpdate::Some(&[pid]),
                        true,
                        refresh,
                    );
                    if let Some(process) = system.process(pid) {
                        let memory_mb = process.memory() as f64 / (1024.0 * 1024.0);
                        let cpu_percent = process.cpu_usage() as f64;
                        metrics.record_system_sample(memory_mb, cpu_percent);
                    }
                }
                debug!("resource sampler exited");
            })
            .expect("spawn monitor thread");

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Signal the sampler to stop and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // A send error means the thread already exited.
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("resource sampler thread panicked");
            }
        }
    }
}

impl Drop for SystemMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_monitor_records_samples_then_stops() {
        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor = SystemMonitor::start(Arc::clone(&metrics), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(120));
        monitor.stop();

        let after_stop = metrics.sample_count();
        assert!(after_stop > 0, "expected at least one resource sample");

        // No sample may land once stop has returned.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(metrics.sample_count(), after_stop);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor = SystemMonitor::start(metrics, Duration::from_millis(10));
        monitor.stop();
        monitor.stop();
    }

    #[test]
    fn test_drop_stops_monitor() {
        let metrics = Arc::new(PerformanceMetrics::new());
        {
            let _monitor = SystemMonitor::start(Arc::clone(&metrics), Duration::from_millis(10));
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = metrics.sample_count();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(metrics.sample_count(), after_drop);
    }
}
