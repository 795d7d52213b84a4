//! Performance accumulation and statistical reduction.
//!
//! One `PerformanceMetrics` instance is shared by reference across every
//! worker of a benchmark scenario plus the background sampler, so all
//! mutation goes through an internal mutex; the raw sequences are never
//! exposed for direct external mutation. Final aggregation is
//! order-independent (sums and percentiles only).

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

/// Synchronized accumulator for latency, resource, and outcome samples.
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    response_times: Vec<f64>,
    memory_mb: Vec<f64>,
    cpu_percent: Vec<f64>,
    successes: u64,
    failures: u64,
    started: Option<Instant>,
    ended: Option<Instant>,
    peak_memory_mb: f64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request's wall-clock latency in seconds.
    pub fn record_response_time(&self, secs: f64) {
        self.inner.lock().expect("metrics lock").response_times.push(secs);
    }

    /// Record one request's pass/fail outcome.
    pub fn record_outcome(&self, success: bool) {
        let mut inner = self.inner.lock().expect("metrics lock");
        if success {
            inner.successes += 1;
        } else {
            inner.failures += 1;
        }
    }

    /// Record one resource sample from the background monitor. Maintains
    /// the running peak so `peak == max(samples)` at all times.
    pub fn record_system_sample(&self, memory_mb: f64, cpu_percent: f64) {
        let mut inner = self.inner.lock().expect("metrics lock");
        inner.memory_mb.push(memory_mb);
        inner.cpu_percent.push(cpu_percent);
        if memory_mb > inner.peak_memory_mb {
            inner.peak_memory_mb = memory_mb;
        }
    }

    /// Mark the workload start instant.
    pub fn mark_start(&self) {
        self.inner.lock().expect("metrics lock").started = Some(Instant::now());
    }

    /// Mark the workload end instant.
    pub fn mark_end(&self) {
        self.inner.lock().expect("metrics lock").ended = Some(Instant::now());
    }

    /// Number of recorded request observations.
    pub fn observation_count(&self) -> usize {
        self.inner.lock().expect("metrics lock").response_times.len()
    }

    /// Number of resource samples recorded by the monitor.
    pub fn sample_count(&self) -> usize {
        self.inner.lock().expect("metrics lock").memory_mb.len()
    }

    /// Reduce the accumulated samples to summary statistics.
    ///
    /// Returns `None` when no request was recorded; empty inputs are a
    /// no-data condition, never a panic.
    pub fn statistics(&self) -> Option<BenchmarkStats> {
        let inner = self.inner.lock().expect("metrics lock");
        if inner.response_times.is_empty() {
            return None;
        }

        let duration_seconds = match (inner.started, inner.ended) {
            (Some(start), Some(end)) if end > start => (end - start).as_secs_f64(),
            _ => 0.0,
        };
        let total_requests = inner.response_times.len();
        let throughput_rps = if duration_seconds > 0.0 {
            total_requests as f64 / duration_seconds
        } else {
            0.0
        };

        let mut sorted = inner.response_times.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite latency sample"));

        Some(BenchmarkStats {
            duration_seconds,
            total_requests,
            successful_requests: inner.successes,
            failed_requests: inner.failures,
            success_rate: inner.successes as f64 / total_requests as f64 * 100.0,
            throughput_rps,
            response_time: ResponseTimeStats {
                min: sorted[0],
                max: sorted[sorted.len() - 1],
                mean: mean(&sorted),
                median: median(&sorted),
                std_dev: std_dev(&sorted),
                p95: nearest_rank_sorted(&sorted, 95.0),
                p99: nearest_rank_sorted(&sorted, 99.0),
            },
            memory: MemoryStats {
                peak_mb: inner.peak_memory_mb,
                avg_mb: if inner.memory_mb.is_empty() { 0.0 } else { mean(&inner.memory_mb) },
                max_mb: inner.memory_mb.iter().copied().fold(0.0, f64::max),
            },
            cpu: CpuStats {
                avg_percent: if inner.cpu_percent.is_empty() { 0.0 } else { mean(&inner.cpu_percent) },
                max_percent: inner.cpu_percent.iter().copied().fold(0.0, f64::max),
            },
        })
    }
}

/// Nearest-rank percentile: sort ascending, index `len * p / 100` floored
/// and clamped to the last element. Not interpolated.
pub fn nearest_rank_percentile(data: &[f64], percentile: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite sample"));
    nearest_rank_sorted(&sorted, percentile)
}

fn nearest_rank_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let index = (sorted.len() as f64 * percentile / 100.0) as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Sample standard deviation; 0 for fewer than two samples.
fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Summary statistics for one benchmark scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStats {
    pub duration_seconds: f64,
    pub total_requests: usize,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub throughput_rps: f64,
    pub response_time: ResponseTimeStats,
    pub memory: MemoryStats,
    pub cpu: CpuStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub peak_mb: f64,
    pub avg_mb: f64,
    pub max_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuStats {
    pub avg_percent: f64,
    pub max_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_percentile_nearest_rank_upper_bias() {
        assert_eq!(nearest_rank_percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 95.0), 5.0);
        assert_eq!(nearest_rank_percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0), 3.0);
        assert_eq!(nearest_rank_percentile(&[5.0, 1.0, 3.0], 0.0), 1.0);
        assert_eq!(nearest_rank_percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn test_statistics_empty_is_none() {
        let metrics = PerformanceMetrics::new();
        assert!(metrics.statistics().is_none());
    }

    #[test]
    fn test_statistics_basic_reduction() {
        let metrics = PerformanceMetrics::new();
        metrics.mark_start();
        for (t, ok) in [(0.1, true), (0.2, true), (0.3, false), (0.4, true)] {
            metrics.record_response_time(t);
            metrics.record_outcome(ok);
        }
        metrics.mark_end();

        let stats = metrics.statistics().unwrap();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.successful_requests, 3);
        assert_eq!(stats.failed_requests, 1);
        assert!((stats.success_rate - 75.0).abs() < f64::EPSILON);
        assert!((stats.response_time.min - 0.1).abs() < 1e-12);
        assert!((stats.response_time.max - 0.4).abs() < 1e-12);
        assert!((stats.response_time.mean - 0.25).abs() < 1e-12);
        assert!((stats.response_time.median - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_peak_memory_tracks_running_max() {
        let metrics = PerformanceMetrics::new();
        metrics.record_system_sample(100.0, 10.0);
        metrics.record_system_sample(250.0, 40.0);
        metrics.record_system_sample(180.0, 20.0);
        metrics.record_response_time(0.1);

        let stats = metrics.statistics().unwrap();
        assert_eq!(stats.memory.peak_mb, 250.0);
        assert_eq!(stats.memory.max_mb, 250.0);
        assert!((stats.cpu.max_percent - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throughput_zero_without_timestamps() {
        let metrics = PerformanceMetrics::new();
        metrics.record_response_time(0.5);
        let stats = metrics.statistics().unwrap();
        assert_eq!(stats.duration_seconds, 0.0);
        assert_eq!(stats.throughput_rps, 0.0);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let metrics = Arc::new(PerformanceMetrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    metrics.record_response_time(0.001 * i as f64);
                    metrics.record_outcome(i % 2 == 0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.observation_count(), 800);
        let stats = metrics.statistics().unwrap();
        assert_eq!(stats.successful_requests + stats.failed_requests, 800);
    }

    #[test]
    fn test_std_dev_single_sample_is_zero() {
        let metrics = PerformanceMetrics::new();
        metrics.record_response_time(0.2);
        metrics.record_outcome(true);
        let stats = metrics.statistics().unwrap();
        assert_eq!(stats.response_time.std_dev, 0.0);
    }
}
