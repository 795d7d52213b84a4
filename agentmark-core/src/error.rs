//! Error types for the Agentmark harness core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering agent invocation, tool-server probing, configuration, and
//! report persistence domains.

use std::path::PathBuf;

/// Top-level error type for the Agentmark core library.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Benchmark error: {0}")]
    Benchmark(#[from] BenchmarkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from agent construction and invocation.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent connection failed: {message}")]
    Connection { message: String },

    #[error("Agent invocation failed: {message}")]
    Invocation { message: String },

    #[error("Agent response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Agent not initialized")]
    NotInitialized,
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from benchmark orchestration.
#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error("Pre-flight check failed: {reason}")]
    PreflightFailed { reason: String },

    #[error("Scenario '{label}' already recorded in this session")]
    DuplicateScenario { label: String },

    #[error("Empty test-case selection for scenario '{label}'")]
    EmptySelection { label: String },

    #[error("Worker thread panicked: {message}")]
    WorkerPanicked { message: String },
}

/// A type alias for results using the top-level `HarnessError`.
pub type Result<T> = std::result::Result<T, HarnessError>;
