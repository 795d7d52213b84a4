//! Fundamental types shared across the harness.
//!
//! Test cases are loaded once from the static catalog and never mutated;
//! observations are created fresh per agent invocation and owned by the
//! executor call that produced them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A structured value extracted from an agent's free-text response.
///
/// The interpreter only ever produces one of these three shapes; anything
/// it cannot recognize is represented as the absence of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedValue {
    Int(i64),
    Float(f64),
    List(Vec<i64>),
}

impl ExtractedValue {
    /// Numeric view of the value, if it is a scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExtractedValue::Int(n) => Some(*n as f64),
            ExtractedValue::Float(f) => Some(*f),
            ExtractedValue::List(_) => None,
        }
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractedValue::Int(n) => write!(f, "{n}"),
            ExtractedValue::Float(x) => write!(f, "{x}"),
            ExtractedValue::List(xs) => write!(f, "{xs:?}"),
        }
    }
}

/// An expectation declared by a test case.
///
/// Covers the shapes the fixture corpus uses: booleans (primality checks),
/// scalars, ordered factor lists, and keyed maps for multi-operation
/// prompts such as `{"gcd": 6, "lcm": 36}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<i64>),
    Map(BTreeMap<String, f64>),
}

/// Prompt complexity tier, carried through from the fixture corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Basic,
    Intermediate,
    Advanced,
    Expert,
    #[default]
    Unspecified,
}

/// Natural language of a prompt, detected from its code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Japanese,
    Mixed,
}

impl Language {
    /// Classify a prompt: CJK code points mean japanese, other non-ASCII
    /// means mixed, pure ASCII means english.
    pub fn detect(text: &str) -> Language {
        if text.chars().any(|c| c as u32 > 0x2FFF) {
            Language::Japanese
        } else if text.chars().any(|c| !c.is_ascii()) {
            Language::Mixed
        } else {
            Language::English
        }
    }
}

/// A single prompt fixture from the static test catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub prompt: String,
    /// Function names the agent is expected to invoke. Empty means the
    /// function check is vacuous.
    #[serde(default)]
    pub expected_functions: Vec<String>,
    /// Expected computed result, if the case declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<ExpectedValue>,
    /// Expected error signature for error-handling cases. When set, all
    /// other checks are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
    #[serde(default)]
    pub complexity: Complexity,
    pub category: String,
}

impl TestCase {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected_functions: Vec::new(),
            expected_result: None,
            expected_error: None,
            complexity: Complexity::Unspecified,
            category: category.into(),
        }
    }

    pub fn expecting_functions<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.expected_functions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn expecting_result(mut self, value: ExpectedValue) -> Self {
        self.expected_result = Some(value);
        self
    }

    pub fn expecting_error(mut self, signature: impl Into<String>) -> Self {
        self.expected_error = Some(signature.into());
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }
}

/// Structured evidence extracted from one agent response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Raw response text as returned by the agent.
    pub response: String,
    /// Function names detected in the response, lower-cased, first-seen
    /// order, no duplicates.
    pub functions: Vec<String>,
    /// Canonical result recovered from the response, if any stage of the
    /// extraction cascade matched.
    pub result: Option<ExtractedValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detect_english() {
        assert_eq!(Language::detect("Calculate the GCD of 48 and 64"), Language::English);
    }

    #[test]
    fn test_language_detect_japanese() {
        assert_eq!(Language::detect("234を素因数分解してください"), Language::Japanese);
    }

    #[test]
    fn test_language_detect_mixed() {
        // Latin text with accented characters but no CJK.
        assert_eq!(Language::detect("café math: 2 × 3"), Language::Mixed);
    }

    #[test]
    fn test_extracted_value_as_f64() {
        assert_eq!(ExtractedValue::Int(21).as_f64(), Some(21.0));
        assert_eq!(ExtractedValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(ExtractedValue::List(vec![3, 3, 11]).as_f64(), None);
    }

    #[test]
    fn test_expected_value_deserialize_untagged() {
        let v: ExpectedValue = serde_json::from_str("15").unwrap();
        assert_eq!(v, ExpectedValue::Int(15));

        let v: ExpectedValue = serde_json::from_str("[2, 3, 3, 13]").unwrap();
        assert_eq!(v, ExpectedValue::List(vec![2, 3, 3, 13]));

        let v: ExpectedValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, ExpectedValue::Bool(false));

        let v: ExpectedValue = serde_json::from_str(r#"{"gcd": 6, "lcm": 36}"#).unwrap();
        match v {
            ExpectedValue::Map(m) => {
                assert_eq!(m.get("gcd"), Some(&6.0));
                assert_eq!(m.get("lcm"), Some(&36.0));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_test_case_builder() {
        let case = TestCase::new("basic_002", "[1, 2, 3, 4, 5]の合計を計算してください", "single_function")
            .expecting_functions(["sum"])
            .expecting_result(ExpectedValue::Int(15))
            .with_complexity(Complexity::Basic);
        assert_eq!(case.id, "basic_002");
        assert_eq!(case.expected_functions, vec!["sum"]);
        assert_eq!(case.expected_result, Some(ExpectedValue::Int(15)));
        assert!(case.expected_error.is_none());
    }
}
