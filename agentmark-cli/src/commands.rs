//! Subcommand implementations.

use anyhow::Context;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use agentmark_core::{
    BenchmarkSession, BenchmarkStats, HarnessConfig, HttpAgentConnector, PerformanceBenchmark,
    TestCase, TestCatalog, TestExecutor, TestSession, save_benchmark_report, save_session,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    Single,
    Concurrent,
    Sustained,
    Stress,
    All,
}

pub struct BenchParams {
    pub iterations: usize,
    pub users: usize,
    pub requests_per_user: usize,
    pub rps: f64,
    pub duration_secs: u64,
    pub max_requests: usize,
}

fn load_catalog(path: Option<PathBuf>) -> anyhow::Result<TestCatalog> {
    match path {
        Some(path) => TestCatalog::from_json_file(&path)
            .with_context(|| format!("loading catalog from {}", path.display())),
        None => Ok(TestCatalog::builtin()),
    }
}

fn select_cases(catalog: &TestCatalog, collection: Option<&str>) -> anyhow::Result<Vec<TestCase>> {
    match collection {
        Some(name) => catalog
            .collection(name)
            .map(<[TestCase]>::to_vec)
            .with_context(|| format!("unknown collection '{name}'")),
        None => Ok(catalog.all_cases().into_iter().cloned().collect()),
    }
}

fn connector(config: &HarnessConfig) -> Arc<HttpAgentConnector> {
    Arc::new(HttpAgentConnector::new(
        config.agent.url.clone(),
        Duration::from_secs(config.agent.timeout_secs),
    ))
}

pub fn run(
    config: HarnessConfig,
    catalog: Option<PathBuf>,
    collection: Option<String>,
    max_tests: Option<usize>,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(catalog)?;
    let cases = select_cases(&catalog, collection.as_deref())?;
    info!(cases = cases.len(), "loaded test cases");

    let mut executor = TestExecutor::new(config.clone(), connector(&config));
    let session = executor.run_test_suite(&cases, max_tests);

    if !session.server_available {
        anyhow::bail!("tool server unavailable at {}", config.server.health_url());
    }
    if !session.agent_initialized {
        anyhow::bail!("agent initialization failed for {}", config.agent.url);
    }

    print_session(&session);

    if let Some(path) = output {
        save_session(&session, &path)?;
        println!("\nSession written to {}", path.display());
    }

    // The exit code travels back to main so the log guard can flush
    // before the process ends.
    if suite_failed(&session) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// A suite with any failed test exits nonzero.
fn suite_failed(session: &TestSession) -> bool {
    session.failed_tests > 0
}

fn print_session(session: &TestSession) {
    println!("\n=== Suite Summary ===");
    println!("Total:    {}", session.total_tests);
    println!("Passed:   {}", session.passed_tests);
    println!("Failed:   {}", session.failed_tests);
    println!("Rate:     {:.1}%", session.success_rate());
    println!("Duration: {:.1}s", session.duration_secs());

    println!("\nBy category:");
    for (category, tally) in session.category_breakdown() {
        println!("  {:<24} {}/{}", category, tally.passed, tally.total);
    }

    let failures: Vec<_> = session.failures().collect();
    if !failures.is_empty() {
        println!("\nFailures:");
        for result in failures {
            let reason = if result.error_message.is_empty() {
                "expectation mismatch"
            } else {
                result.error_message.as_str()
            };
            println!("  {:<16} {}", result.id, reason);
        }
    }
}

pub fn bench(
    config: HarnessConfig,
    scenario: Scenario,
    catalog: Option<PathBuf>,
    params: BenchParams,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(catalog)?;
    // Load scenarios cycle over the simpler prompts.
    let cases = select_cases(&catalog, Some("basic"))?;

    let benchmark = PerformanceBenchmark::new(config.clone(), connector(&config));
    let mut session = BenchmarkSession::new();

    if matches!(scenario, Scenario::Single | Scenario::All) {
        let metrics = benchmark.single_request(&cases, params.iterations)?;
        if let Some(stats) = metrics.statistics() {
            print_stats("single_request", &stats);
            session.record("single_request", stats)?;
        }
    }
    if matches!(scenario, Scenario::Concurrent | Scenario::All) {
        let metrics = benchmark.concurrent(&cases, params.users, params.requests_per_user)?;
        if let Some(stats) = metrics.statistics() {
            print_stats("concurrent", &stats);
            session.record("concurrent", stats)?;
        }
    }
    if matches!(scenario, Scenario::Sustained | Scenario::All) {
        let metrics = benchmark.sustained_load(
            &cases,
            params.rps,
            Duration::from_secs(params.duration_secs),
        )?;
        if let Some(stats) = metrics.statistics() {
            print_stats("sustained_load", &stats);
            session.record("sustained_load", stats)?;
        }
    }
    if matches!(scenario, Scenario::Stress | Scenario::All) {
        let metrics = benchmark.stress(&cases, params.max_requests)?;
        if let Some(stats) = metrics.statistics() {
            print_stats("stress", &stats);
            session.record("stress", stats)?;
        }
    }

    if let Some(path) = output {
        save_benchmark_report(&session, &path)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_stats(label: &str, stats: &BenchmarkStats) {
    println!("\n=== {label} ===");
    println!(
        "Requests:   {} total, {} ok, {} failed ({:.1}%)",
        stats.total_requests, stats.successful_requests, stats.failed_requests, stats.success_rate
    );
    println!("Throughput: {:.2} req/s over {:.1}s", stats.throughput_rps, stats.duration_seconds);
    println!(
        "Latency:    mean {:.3}s, median {:.3}s, p95 {:.3}s, p99 {:.3}s, max {:.3}s",
        stats.response_time.mean,
        stats.response_time.median,
        stats.response_time.p95,
        stats.response_time.p99,
        stats.response_time.max
    );
    println!(
        "Memory:     avg {:.1} MB, peak {:.1} MB",
        stats.memory.avg_mb, stats.memory.peak_mb
    );
    println!(
        "CPU:        avg {:.1}%, max {:.1}%",
        stats.cpu.avg_percent, stats.cpu.max_percent
    );
}

pub fn list(catalog: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(catalog)?;
    let stats = catalog.statistics();

    println!("{} test cases", stats.total);
    println!("\nBy collection:");
    for (name, count) in &stats.by_collection {
        println!("  {name:<16} {count}");
    }
    println!("\nBy language:");
    for (language, count) in &stats.by_language {
        println!("  {language:<16} {count}");
    }

    println!("\nCases:");
    for name in catalog.collection_names() {
        for case in catalog.collection(name).unwrap_or_default() {
            println!("  {:<16} [{}] {}", case.id, name, case.prompt);
        }
    }
    Ok(ExitCode::SUCCESS)
}
