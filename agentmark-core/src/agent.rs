//! Agent collaborator abstraction.
//!
//! The system under test is consumed through a single contract:
//! `invoke({"input": prompt})` returning either a mapping with an `output`
//! text field or a bare text value. `HttpAgent` speaks that contract over
//! HTTP; `ScriptedAgent` provides canned responses for tests and offline
//! dry runs.

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::AgentError;

/// Handle to one agent instance. Executors own their handle exclusively;
/// benchmark workers each connect their own to avoid cross-worker
/// interference.
pub trait Agent: Send {
    /// Send one prompt and return the raw response value. Blocking; any
    /// timeout discipline belongs to the collaborator itself.
    fn invoke(&mut self, prompt: &str) -> Result<Value, AgentError>;
}

/// Factory for agent handles, shared across benchmark workers.
pub trait AgentConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Agent>, AgentError>;
}

/// Flatten an agent response value into display text: a mapping with an
/// `output` field yields that field, a bare string yields itself, anything
/// else is serialized as-is.
pub fn response_text(value: &Value) -> String {
    match value {
        Value::Object(map) => match map.get("output") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Connector for an HTTP agent endpoint.
#[derive(Debug, Clone)]
pub struct HttpAgentConnector {
    endpoint: String,
    timeout: Duration,
}

impl HttpAgentConnector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl AgentConnector for HttpAgentConnector {
    fn connect(&self) -> Result<Box<dyn Agent>, AgentError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AgentError::Connection {
                message: e.to_string(),
            })?;
        Ok(Box::new(HttpAgent {
            client,
            endpoint: self.endpoint.clone(),
        }))
    }
}

/// Agent handle that POSTs `{"input": prompt}` to an HTTP endpoint.
pub struct HttpAgent {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl Agent for HttpAgent {
    fn invoke(&mut self, prompt: &str) -> Result<Value, AgentError> {
        debug!(endpoint = %self.endpoint, "invoking http agent");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "input": prompt }))
            .send()
            .map_err(|e| AgentError::Invocation {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Invocation {
                message: format!("agent endpoint returned status {status}"),
            });
        }

        let body = response.text().map_err(|e| AgentError::ResponseParse {
            message: e.to_string(),
        })?;
        // Some deployments return plain text rather than JSON.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

type ScriptFn = dyn Fn(&str) -> Result<String, AgentError> + Send + Sync;

/// Connector producing scripted agents. Counts invocations across every
/// handle it produced, so tests can assert "zero agent calls happened".
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Arc<ScriptFn>,
    invocations: Arc<AtomicUsize>,
    fail_connect: bool,
}

impl ScriptedConnector {
    /// Every prompt gets the same canned response.
    pub fn always(response: impl Into<String>) -> Self {
        let response = response.into();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Responses computed from the prompt.
    pub fn from_fn<F>(script: F) -> Self
    where
        F: Fn(&str) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            invocations: Arc::new(AtomicUsize::new(0)),
            fail_connect: false,
        }
    }

    /// A connector whose `connect` always fails, for pre-flight tests.
    pub fn failing() -> Self {
        let mut connector = Self::always("");
        connector.fail_connect = true;
        connector
    }

    /// Total invocations across all handles from this connector.
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl AgentConnector for ScriptedConnector {
    fn connect(&self) -> Result<Box<dyn Agent>, AgentError> {
        if self.fail_connect {
            return Err(AgentError::Connection {
                message: "scripted connector configured to fail".into(),
            });
        }
        Ok(Box::new(ScriptedAgent {
            script: Arc::clone(&self.script),
            invocations: Arc::clone(&self.invocations),
        }))
    }
}

/// Agent handle that answers from a script instead of a live deployment.
pub struct ScriptedAgent {
    script: Arc<ScriptFn>,
    invocations: Arc<AtomicUsize>,
}

impl Agent for ScriptedAgent {
    fn invoke(&mut self, prompt: &str) -> Result<Value, AgentError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let output = (self.script)(prompt)?;
        Ok(json!({ "output": output }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_output_field() {
        let value = json!({"output": "the sum is 15", "steps": 3});
        assert_eq!(response_text(&value), "the sum is 15");
    }

    #[test]
    fn test_response_text_bare_string() {
        assert_eq!(response_text(&Value::String("plain".into())), "plain");
    }

    #[test]
    fn test_response_text_object_without_output() {
        let value = json!({"answer": 42});
        assert_eq!(response_text(&value), r#"{"answer":42}"#);
    }

    #[test]
    fn test_scripted_agent_counts_invocations() {
        let connector = ScriptedConnector::always("答えは21です");
        let mut agent = connector.connect().unwrap();
        agent.invoke("first").unwrap();
        agent.invoke("second").unwrap();
        assert_eq!(connector.invocation_count(), 2);

        // Handles share the connector-wide counter.
        let mut second = connector.connect().unwrap();
        second.invoke("third").unwrap();
        assert_eq!(connector.invocation_count(), 3);
    }

    #[test]
    fn test_failing_connector() {
        let connector = ScriptedConnector::failing();
        assert!(connector.connect().is_err());
        assert_eq!(connector.invocation_count(), 0);
    }

    #[test]
    fn test_scripted_agent_error_script() {
        let connector = ScriptedConnector::from_fn(|_| {
            Err(AgentError::Invocation {
                message: "ArgumentException: Cannot divide by zero".into(),
            })
        });
        let mut agent = connector.connect().unwrap();
        let err = agent.invoke("10 ÷ 0").unwrap_err();
        assert!(err.to_string().contains("Cannot divide by zero"));
        assert_eq!(connector.invocation_count(), 1);
    }
}
