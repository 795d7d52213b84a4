//! Observation-count and termination guarantees of the benchmark
//! scenarios.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use agentmark_core::{
    AgentError, ExpectedValue, HarnessConfig, PerformanceBenchmark, ScriptedConnector, TestCase,
};

fn spawn_health_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind health listener");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
            );
        }
    });
    format!("http://{addr}")
}

fn fast_config(server_url: String) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.server.url = server_url;
    config.server.health_timeout_secs = 2;
    config.suite.inter_test_pause_ms = 0;
    config.pacing.single_request_pause_ms = 0;
    config.pacing.monitor_interval_ms = 20;
    config
}

fn sample_cases() -> Vec<TestCase> {
    vec![
        TestCase::new("b1", "[1, 2, 3]の合計を計算してください", "single_function")
            .expecting_functions(["sum"])
            .expecting_result(ExpectedValue::Int(6)),
        TestCase::new("b2", "7は素数ですか？", "single_function")
            .expecting_functions(["is_prime"]),
    ]
}

#[test]
fn concurrent_records_exactly_users_times_requests() {
    let server = spawn_health_server();
    let connector = ScriptedConnector::always("Invoking: `sum` with {'numbers': [1, 2, 3]}\n\n6");
    let benchmark = PerformanceBenchmark::new(fast_config(server), Arc::new(connector));

    let metrics = benchmark.concurrent(&sample_cases(), 5, 5).unwrap();
    assert_eq!(metrics.observation_count(), 25);

    let stats = metrics.statistics().unwrap();
    assert_eq!(stats.total_requests, 25);
    assert_eq!(stats.successful_requests + stats.failed_requests, 25);
}

#[test]
fn concurrent_count_stays_exact_under_invocation_failures() {
    let server = spawn_health_server();
    // Every other prompt errors out; the count must not drift.
    let connector = ScriptedConnector::from_fn(|prompt| {
        if prompt.contains("素数") {
            Err(AgentError::Invocation {
                message: "connection reset".into(),
            })
        } else {
            Ok("答えは6です".to_string())
        }
    });
    let benchmark = PerformanceBenchmark::new(fast_config(server), Arc::new(connector));

    let metrics = benchmark.concurrent(&sample_cases(), 4, 6).unwrap();
    assert_eq!(metrics.observation_count(), 24);
    let stats = metrics.statistics().unwrap();
    assert_eq!(stats.successful_requests + stats.failed_requests, 24);
    assert!(stats.failed_requests > 0);
}

#[test]
fn single_request_records_one_observation_per_iteration() {
    let server = spawn_health_server();
    let connector = ScriptedConnector::always("答えは6です");
    let benchmark =
        PerformanceBenchmark::new(fast_config(server), Arc::new(connector.clone()));

    let metrics = benchmark.single_request(&sample_cases(), 12).unwrap();
    assert_eq!(metrics.observation_count(), 12);
    // Pre-flight connects but never invokes, so twelve calls exactly.
    assert_eq!(connector.invocation_count(), 12);
}

#[test]
fn sustained_load_terminates_at_the_deadline() {
    let server = spawn_health_server();
    let connector = ScriptedConnector::always("答えは6です");
    let benchmark = PerformanceBenchmark::new(fast_config(server), Arc::new(connector));

    let started = Instant::now();
    let metrics = benchmark
        .sustained_load(&sample_cases(), 50.0, Duration::from_millis(200))
        .unwrap();
    let elapsed = started.elapsed();

    assert!(metrics.observation_count() >= 1);
    // Deadline plus pre-flight and one in-flight request of slack.
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");

    let stats = metrics.statistics().unwrap();
    assert!(stats.duration_seconds > 0.0);
    assert!(stats.throughput_rps > 0.0);
}

#[test]
fn sustained_load_rejects_nonpositive_rate() {
    let server = spawn_health_server();
    let connector = ScriptedConnector::always("答えは6です");
    let benchmark = PerformanceBenchmark::new(fast_config(server), Arc::new(connector.clone()));

    let err = benchmark
        .sustained_load(&sample_cases(), 0.0, Duration::from_millis(100))
        .unwrap_err();
    assert!(err.to_string().contains("must be positive"));
    assert_eq!(connector.invocation_count(), 0);
}

#[test]
fn stress_records_exactly_max_requests() {
    let server = spawn_health_server();
    let connector = ScriptedConnector::always("答えは6です");
    let benchmark = PerformanceBenchmark::new(fast_config(server), Arc::new(connector));

    let metrics = benchmark.stress(&sample_cases(), 30).unwrap();
    assert_eq!(metrics.observation_count(), 30);
}

#[test]
fn preflight_blocks_scenarios_when_server_is_down() {
    // Nothing listens on port 1.
    let mut config = fast_config("http://127.0.0.1:1".into());
    config.server.health_timeout_secs = 1;
    let connector = ScriptedConnector::always("unused");
    let benchmark = PerformanceBenchmark::new(config, Arc::new(connector.clone()));

    let err = benchmark.single_request(&sample_cases(), 5).unwrap_err();
    assert!(err.to_string().contains("unavailable"));
    assert_eq!(connector.invocation_count(), 0);
}
