//! Configuration system for the harness.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment. The file is `agentmark.toml` in the working directory, or
//! an explicit path passed by the front-end. Environment variables use the
//! `AGENTMARK_` prefix with `__` as the section separator, e.g.
//! `AGENTMARK_SERVER__URL`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Top-level configuration for the harness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub server: ServerConfig,
    pub agent: AgentEndpointConfig,
    pub suite: SuiteConfig,
    pub pacing: PacingConfig,
}

/// Tool-server health collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL; the health probe hits `{url}/tools`.
    pub url: String,
    /// Health probe timeout in seconds.
    pub health_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".into(),
            health_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn health_url(&self) -> String {
        format!("{}/tools", self.url.trim_end_matches('/'))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

/// HTTP agent collaborator endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEndpointConfig {
    /// Invocation endpoint receiving `{"input": prompt}`.
    pub url: String,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AgentEndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081/invoke".into(),
            timeout_secs: 120,
        }
    }
}

/// Sequential suite execution knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Fixed pause between tests in milliseconds.
    pub inter_test_pause_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            inter_test_pause_ms: 500,
        }
    }
}

impl SuiteConfig {
    pub fn inter_test_pause(&self) -> Duration {
        Duration::from_millis(self.inter_test_pause_ms)
    }
}

/// Benchmark pacing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause between single-request iterations in milliseconds.
    pub single_request_pause_ms: u64,
    /// Resource sampling cadence in milliseconds.
    pub monitor_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            single_request_pause_ms: 10,
            monitor_interval_ms: 100,
        }
    }
}

impl PacingConfig {
    pub fn single_request_pause(&self) -> Duration {
        Duration::from_millis(self.single_request_pause_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

/// Load layered configuration: defaults, then `agentmark.toml` (or an
/// explicit file), then `AGENTMARK_`-prefixed environment variables.
///
/// An explicitly named file must exist; the implicit `agentmark.toml`
/// layer is optional.
pub fn load_config(explicit_path: Option<&Path>) -> Result<HarnessConfig> {
    let mut figment = Figment::from(Serialized::defaults(HarnessConfig::default()));

    match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            figment = figment.merge(Toml::file(path));
        }
        None => figment = figment.merge(Toml::file("agentmark.toml")),
    }

    figment = figment.merge(Env::prefixed("AGENTMARK_").split("__"));
    figment.extract().map_err(|e| {
        ConfigError::ParseError {
            message: e.to_string(),
        }
        .into()
    })
}
