//! # Agentmark Core
//!
//! Core library for the Agentmark evaluation harness.
//! Provides the response interpreter, success evaluator, test executor,
//! performance benchmark scenarios, resource monitoring, the built-in
//! test catalog, configuration, and fundamental types.

pub mod agent;
pub mod benchmark;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod interpreter;
pub mod metrics;
pub mod monitor;
pub mod report;
pub mod session;
pub mod types;

// Re-export commonly used types at the crate root.
pub use agent::{Agent, AgentConnector, HttpAgentConnector, ScriptedConnector};
pub use benchmark::{BenchmarkSession, PerformanceBenchmark};
pub use catalog::{CatalogStats, TestCatalog};
pub use config::{HarnessConfig, load_config};
pub use error::{AgentError, BenchmarkError, HarnessError, Result};
pub use evaluator::{CheckKind, CheckRecord, Verdict, evaluate};
pub use executor::TestExecutor;
pub use interpreter::{KNOWN_FUNCTIONS, extract_functions, extract_result};
pub use metrics::{BenchmarkStats, PerformanceMetrics, nearest_rank_percentile};
pub use monitor::SystemMonitor;
pub use report::{SystemInfo, save_benchmark_report, save_session};
pub use session::{CategoryTally, TestResult, TestSession};
pub use types::{
    Complexity, ExpectedValue, ExtractedValue, Language, Observation, TestCase,
};
