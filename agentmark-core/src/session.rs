//! Per-test results and session aggregation.
//!
//! A session maintains its counters incrementally as results are appended
//! so a streaming front-end can display totals without rescanning; the
//! invariant `total == passed + failed == results.len()` holds after every
//! append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::evaluator::CheckRecord;
use crate::types::{ExpectedValue, Language, Observation};

/// Outcome of one executed test case. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub category: String,
    pub success: bool,
    /// Wall-clock duration of the agent call, in seconds.
    pub execution_secs: f64,
    pub prompt: String,
    pub language: Language,
    /// Evidence extracted from the agent response.
    pub observation: Observation,
    /// Empty string means no error.
    pub error_message: String,
    /// Echo of the declared expectations, for audit.
    #[serde(default)]
    pub expected_functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<ExpectedValue>,
    /// Diagnostic trail from the evaluator.
    #[serde(default)]
    pub trail: Vec<CheckRecord>,
}

/// Pass/fail tallies for one category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryTally {
    pub total: usize,
    pub passed: usize,
}

/// Aggregate of a sequential suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    pub started_at: DateTime<Utc>,
    /// Set exactly once by `finish`.
    pub finished_at: Option<DateTime<Utc>>,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub server_available: bool,
    pub agent_initialized: bool,
    pub results: Vec<TestResult>,
}

impl TestSession {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            server_available: false,
            agent_initialized: false,
            results: Vec::new(),
        }
    }

    /// Append one result, updating the running counters.
    pub fn add_result(&mut self, result: TestResult) {
        if result.success {
            self.passed_tests += 1;
        } else {
            self.failed_tests += 1;
        }
        self.total_tests += 1;
        self.results.push(result);
        debug_assert_eq!(self.total_tests, self.passed_tests + self.failed_tests);
        debug_assert_eq!(self.total_tests, self.results.len());
    }

    /// Mark the session finished. The end timestamp is set only once.
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    /// Session duration in seconds; for an unfinished session, time since
    /// start.
    pub fn duration_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Success rate as a percentage; 0 for an empty session.
    pub fn success_rate(&self) -> f64 {
        if self.total_tests == 0 {
            return 0.0;
        }
        self.passed_tests as f64 / self.total_tests as f64 * 100.0
    }

    /// Pass/total tallies per category, in category order.
    pub fn category_breakdown(&self) -> BTreeMap<String, CategoryTally> {
        let mut breakdown: BTreeMap<String, CategoryTally> = BTreeMap::new();
        for result in &self.results {
            let tally = breakdown.entry(result.category.clone()).or_default();
            tally.total += 1;
            if result.success {
                tally.passed += 1;
            }
        }
        breakdown
    }

    /// Failed results, for triage displays.
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}
