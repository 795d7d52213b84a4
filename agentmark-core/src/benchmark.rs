//! Load-shape benchmark orchestration.
//!
//! Four scenarios — single-stream, concurrent-multiuser, fixed-rate
//! sustained load, and closed-loop stress — all share the same lifecycle:
//! pre-flight checks, start the resource sampler, mark the start instant,
//! run the workload, mark the end instant, stop the sampler. The sampler
//! stop is guaranteed by the monitor's drop guard even when a workload
//! errors. Thread count is bounded by the scenario's configured
//! concurrency: one thread per simulated user plus the sampler.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::agent::AgentConnector;
use crate::config::HarnessConfig;
use crate::error::{BenchmarkError, Result};
use crate::executor::TestExecutor;
use crate::metrics::{BenchmarkStats, PerformanceMetrics};
use crate::monitor::SystemMonitor;
use crate::types::TestCase;

/// One worker's per-request outcome, funnelled through the result queue.
#[derive(Debug)]
struct WorkerObservation {
    response_secs: f64,
    success: bool,
    user_id: usize,
    request_id: usize,
    error: Option<String>,
}

pub struct PerformanceBenchmark {
    config: HarnessConfig,
    connector: Arc<dyn AgentConnector>,
}

impl PerformanceBenchmark {
    pub fn new(config: HarnessConfig, connector: Arc<dyn AgentConnector>) -> Self {
        Self { config, connector }
    }

    /// Pre-flight gate: server reachable and agent constructible. Returns
    /// a ready executor, or fails before any monitor starts.
    fn preflight(&self, label: &str, cases: &[TestCase]) -> Result<TestExecutor> {
        if cases.is_empty() {
            return Err(BenchmarkError::EmptySelection { label: label.into() }.into());
        }
        let mut executor = TestExecutor::new(self.config.clone(), Arc::clone(&self.connector));
        if !executor.check_server_availability() {
            return Err(BenchmarkError::PreflightFailed {
                reason: "tool server unavailable".into(),
            }
            .into());
        }
        if !executor.initialize_agent() {
            return Err(BenchmarkError::PreflightFailed {
                reason: "agent initialization failed".into(),
            }
            .into());
        }
        Ok(executor)
    }

    /// Sequential loop over `iterations`, one request at a time with a
    /// small fixed pause. Per-iteration faults are recorded with their
    /// elapsed time and never abort the loop.
    pub fn single_request(
        &self,
        cases: &[TestCase],
        iterations: usize,
    ) -> Result<Arc<PerformanceMetrics>> {
        info!(iterations, "single-request benchmark");
        let mut executor = self.preflight("single_request", cases)?;

        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor =
            SystemMonitor::start(Arc::clone(&metrics), self.config.pacing.monitor_interval());
        metrics.mark_start();

        for i in 0..iterations {
            if i % 10 == 0 {
                info!(progress = i, total = iterations, "single-request progress");
            }
            let case = &cases[i % cases.len()];
            record_one(&metrics, &mut executor, case);
            thread::sleep(self.config.pacing.single_request_pause());
        }

        metrics.mark_end();
        monitor.stop();
        Ok(metrics)
    }

    /// `concurrent_users` workers, each owning an independent executor
    /// and agent handle, each issuing `requests_per_user` sequential
    /// requests. Outcomes flow through one mpsc queue; the orchestrator
    /// joins all workers, then drains the queue into the shared metrics.
    /// No ordering is guaranteed across workers.
    pub fn concurrent(
        &self,
        cases: &[TestCase],
        concurrent_users: usize,
        requests_per_user: usize,
    ) -> Result<Arc<PerformanceMetrics>> {
        info!(concurrent_users, requests_per_user, "concurrent benchmark");
        let _gate = self.preflight("concurrent", cases)?;

        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor =
            SystemMonitor::start(Arc::clone(&metrics), self.config.pacing.monitor_interval());
        metrics.mark_start();

        let (tx, rx) = mpsc::channel::<WorkerObservation>();
        let mut workers = Vec::with_capacity(concurrent_users);

        for user_id in 0..concurrent_users {
            let tx = tx.clone();
            let config = self.config.clone();
            let connector = Arc::clone(&self.connector);
            let cases = cases.to_vec();

            workers.push(thread::spawn(move || {
                let mut executor = TestExecutor::new(config, connector);
                if !executor.initialize_agent() {
                    // Account for every planned request so the aggregate
                    // observation count stays exact.
                    for request_id in 0..requests_per_user {
                        let _ = tx.send(WorkerObservation {
                            response_secs: 0.0,
                            success: false,
                            user_id,
                            request_id,
                            error: Some("agent initialization failed".into()),
                        });
                    }
                    return;
                }

                for request_id in 0..requests_per_user {
                    let case = &cases[(user_id * requests_per_user + request_id) % cases.len()];
                    let started = Instant::now();
                    let result = executor.execute_test(case);
                    let _ = tx.send(WorkerObservation {
                        response_secs: started.elapsed().as_secs_f64(),
                        success: result.success,
                        user_id,
                        request_id,
                        error: (!result.error_message.is_empty()).then(|| result.error_message),
                    });
                }
            }));
        }
        drop(tx);

        let mut panicked = 0usize;
        for worker in workers {
            if worker.join().is_err() {
                panicked += 1;
            }
        }

        for observation in rx.iter() {
            if let Some(error) = &observation.error {
                warn!(
                    user = observation.user_id,
                    request = observation.request_id,
                    %error,
                    "worker request failed"
                );
            }
            metrics.record_response_time(observation.response_secs);
            metrics.record_outcome(observation.success);
        }

        metrics.mark_end();
        monitor.stop();

        if panicked > 0 {
            return Err(BenchmarkError::WorkerPanicked {
                message: format!("{panicked} worker(s) panicked"),
            }
            .into());
        }
        Ok(metrics)
    }

    /// Hold a target request rate until the wall-clock deadline. Pacing is
    /// best-effort: a request slower than the nominal interval degrades
    /// the achieved rate, it never triggers a catch-up burst.
    pub fn sustained_load(
        &self,
        cases: &[TestCase],
        target_rps: f64,
        duration: Duration,
    ) -> Result<Arc<PerformanceMetrics>> {
        info!(target_rps, duration_secs = duration.as_secs_f64(), "sustained-load benchmark");
        if target_rps <= 0.0 {
            return Err(BenchmarkError::PreflightFailed {
                reason: format!("target rate must be positive, got {target_rps}"),
            }
            .into());
        }
        let mut executor = self.preflight("sustained_load", cases)?;

        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor =
            SystemMonitor::start(Arc::clone(&metrics), self.config.pacing.monitor_interval());
        metrics.mark_start();

        let interval = Duration::from_secs_f64(1.0 / target_rps);
        let deadline = Instant::now() + duration;
        let mut request_count = 0usize;

        while Instant::now() < deadline {
            let case = &cases[request_count % cases.len()];
            let started = Instant::now();
            record_one(&metrics, &mut executor, case);
            request_count += 1;

            if request_count % 50 == 0 {
                info!(requests = request_count, "sustained-load progress");
            }

            thread::sleep(interval.saturating_sub(started.elapsed()));
        }

        metrics.mark_end();
        monitor.stop();
        Ok(metrics)
    }

    /// Fixed request count, back-to-back with no pacing delay, to surface
    /// resource growth under maximum offered load.
    pub fn stress(&self, cases: &[TestCase], max_requests: usize) -> Result<Arc<PerformanceMetrics>> {
        info!(max_requests, "stress benchmark");
        let mut executor = self.preflight("stress", cases)?;

        let metrics = Arc::new(PerformanceMetrics::new());
        let mut monitor =
            SystemMonitor::start(Arc::clone(&metrics), self.config.pacing.monitor_interval());
        metrics.mark_start();

        for i in 0..max_requests {
            if i % 100 == 0 {
                info!(progress = i, total = max_requests, "stress progress");
            }
            record_one(&metrics, &mut executor, &cases[i % cases.len()]);
        }

        metrics.mark_end();
        monitor.stop();
        Ok(metrics)
    }
}

/// Execute one case and record timing and outcome. A panic inside the
/// execution path is recorded as a failed observation with its elapsed
/// time; it never aborts the workload loop.
fn record_one(metrics: &PerformanceMetrics, executor: &mut TestExecutor, case: &TestCase) {
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| executor.execute_test(case)));
    let elapsed = started.elapsed().as_secs_f64();
    metrics.record_response_time(elapsed);
    match outcome {
        Ok(result) => metrics.record_outcome(result.success),
        Err(_) => {
            warn!(id = %case.id, "request execution panicked");
            metrics.record_outcome(false);
        }
    }
}

/// Named scenario snapshots for one benchmark session; labels are unique.
#[derive(Debug, Default, serde::Serialize)]
#[serde(transparent)]
pub struct BenchmarkSession {
    scenarios: BTreeMap<String, BenchmarkStats>,
}

impl BenchmarkSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scenario's statistics under a unique label.
    pub fn record(&mut self, label: impl Into<String>, stats: BenchmarkStats) -> Result<()> {
        let label = label.into();
        if self.scenarios.contains_key(&label) {
            return Err(BenchmarkError::DuplicateScenario { label }.into());
        }
        self.scenarios.insert(label, stats);
        Ok(())
    }

    pub fn scenarios(&self) -> &BTreeMap<String, BenchmarkStats> {
        &self.scenarios
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
