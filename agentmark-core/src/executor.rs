//! Test execution engine.
//!
//! The executor owns one agent handle for its lifetime and is the failure
//! boundary for a single test: any fault from the agent call is folded
//! into a failed `TestResult`, never propagated to the suite runner.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentConnector, response_text};
use crate::config::HarnessConfig;
use crate::error::AgentError;
use crate::evaluator::evaluate;
use crate::interpreter::{extract_functions, extract_result};
use crate::session::{TestResult, TestSession};
use crate::types::{Language, Observation, TestCase};

pub struct TestExecutor {
    config: HarnessConfig,
    connector: Arc<dyn AgentConnector>,
    http: reqwest::blocking::Client,
    agent: Option<Box<dyn Agent>>,
}

impl TestExecutor {
    pub fn new(config: HarnessConfig, connector: Arc<dyn AgentConnector>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.server.health_timeout())
            .build()
            .unwrap_or_default();
        Self {
            config,
            connector,
            http,
            agent: None,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Probe the tool server. Status 200 means available; any transport
    /// error or other status means unavailable. Never propagates.
    pub fn check_server_availability(&self) -> bool {
        let url = self.config.server.health_url();
        match self.http.get(&url).send() {
            Ok(response) => {
                let available = response.status().as_u16() == 200;
                if !available {
                    warn!(%url, status = %response.status(), "tool server probe returned non-200");
                }
                available
            }
            Err(e) => {
                warn!(%url, error = %e, "tool server probe failed");
                false
            }
        }
    }

    /// Construct and hold one agent handle. On failure the executor stays
    /// unusable until retried.
    pub fn initialize_agent(&mut self) -> bool {
        match self.connector.connect() {
            Ok(agent) => {
                self.agent = Some(agent);
                true
            }
            Err(e) => {
                warn!(error = %e, "agent initialization failed");
                self.agent = None;
                false
            }
        }
    }

    /// Execute one test case end-to-end: invoke, extract, evaluate.
    ///
    /// Only the agent call is timed. An agent fault becomes a failed
    /// result carrying the fault's message, still fed through the
    /// evaluator so expected-error cases can match the signature.
    pub fn execute_test(&mut self, case: &TestCase) -> TestResult {
        let language = Language::detect(&case.prompt);
        debug!(id = %case.id, ?language, "executing test");

        let (observation, error_message, elapsed) = match self.agent.as_mut() {
            None => (
                Observation::default(),
                AgentError::NotInitialized.to_string(),
                0.0,
            ),
            Some(agent) => {
                let started = Instant::now();
                let outcome = agent.invoke(&case.prompt);
                let elapsed = started.elapsed().as_secs_f64();
                match outcome {
                    Ok(value) => {
                        let response = response_text(&value);
                        let observation = Observation {
                            functions: extract_functions(&response),
                            result: extract_result(&response),
                            response,
                        };
                        (observation, String::new(), elapsed)
                    }
                    Err(e) => (Observation::default(), e.to_string(), elapsed),
                }
            }
        };

        let verdict = evaluate(case, &observation, &error_message);
        // An agent fault always fails the test unless the case declared
        // an expected error signature; the evaluator judges that path.
        let success = verdict.passed && (error_message.is_empty() || case.expected_error.is_some());
        debug!(id = %case.id, success, "test evaluated");

        TestResult {
            id: case.id.clone(),
            category: case.category.clone(),
            success,
            execution_secs: elapsed,
            prompt: case.prompt.clone(),
            language,
            observation,
            error_message,
            expected_functions: case.expected_functions.clone(),
            expected_result: case.expected_result.clone(),
            trail: verdict.trail,
        }
    }

    /// Run a suite sequentially.
    ///
    /// Both pre-flight gates run first; if either fails the returned
    /// session is empty and unfinished, and no agent call was attempted.
    /// A per-test panic is folded into a synthetic failed result so one
    /// bad case never aborts the suite.
    pub fn run_test_suite(&mut self, cases: &[TestCase], max_tests: Option<usize>) -> TestSession {
        let mut session = TestSession::new();
        let limit = max_tests.unwrap_or(cases.len()).min(cases.len());
        info!(total = limit, "starting test suite");

        session.server_available = self.check_server_availability();
        if !session.server_available {
            warn!("tool server unavailable, aborting suite before execution");
            return session;
        }

        session.agent_initialized = self.initialize_agent();
        if !session.agent_initialized {
            warn!("agent initialization failed, aborting suite before execution");
            return session;
        }

        for case in cases.iter().take(limit) {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.execute_test(case)));
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic);
                    warn!(id = %case.id, %message, "test crashed, recording synthetic failure");
                    synthetic_failure(case, message)
                }
            };

            if result.success {
                info!(id = %case.id, secs = result.execution_secs, "test passed");
            } else {
                info!(id = %case.id, secs = result.execution_secs, error = %result.error_message, "test failed");
            }
            session.add_result(result);

            thread::sleep(self.config.suite.inter_test_pause());
        }

        session.finish();
        info!(
            total = session.total_tests,
            passed = session.passed_tests,
            failed = session.failed_tests,
            rate = session.success_rate(),
            "test suite complete"
        );
        session
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Test crashed: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Test crashed: {s}")
    } else {
        "Test crashed".to_string()
    }
}

fn synthetic_failure(case: &TestCase, message: String) -> TestResult {
    TestResult {
        id: case.id.clone(),
        category: case.category.clone(),
        success: false,
        execution_secs: 0.0,
        prompt: case.prompt.clone(),
        language: Language::detect(&case.prompt),
        observation: Observation::default(),
        error_message: message,
        expected_functions: case.expected_functions.clone(),
        expected_result: case.expected_result.clone(),
        trail: Vec::new(),
    }
}
