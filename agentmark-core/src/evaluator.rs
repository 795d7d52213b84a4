//! Verdict logic — compares an observation against a test case's
//! expectations and records a diagnostic trail for reporting.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ExpectedValue, ExtractedValue, Observation, TestCase};

/// Absolute tolerance for numeric comparisons.
pub const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Which expectation a check record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ExpectedError,
    FunctionCoverage,
    ResultMatch,
}

/// One entry in the diagnostic trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub kind: CheckKind,
    pub passed: bool,
    pub note: String,
}

/// Pass/fail verdict plus the trail of checks that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub trail: Vec<CheckRecord>,
}

impl Verdict {
    fn record(&mut self, kind: CheckKind, passed: bool, note: impl Into<String>) {
        let note = note.into();
        debug!(?kind, passed, %note, "evaluation check");
        self.trail.push(CheckRecord { kind, passed, note });
    }
}

/// Evaluate one observation against a test case.
///
/// An expected-error case succeeds iff the signature appears
/// (case-insensitive) in `error_message`, skipping all other checks.
/// Otherwise the function check and the result check must both pass; each
/// defaults to true when the case declares no corresponding expectation.
pub fn evaluate(case: &TestCase, observation: &Observation, error_message: &str) -> Verdict {
    let mut verdict = Verdict {
        passed: true,
        trail: Vec::new(),
    };

    if let Some(signature) = &case.expected_error {
        let hit = error_message.to_lowercase().contains(&signature.to_lowercase());
        verdict.record(
            CheckKind::ExpectedError,
            hit,
            format!("expected error signature '{signature}' in '{error_message}'"),
        );
        verdict.passed = hit;
        return verdict;
    }

    let functions_ok = check_functions(case, observation, &mut verdict);
    let result_ok = check_result(case, observation, &mut verdict);
    verdict.passed = functions_ok && result_ok;
    verdict
}

/// Every expected function must appear in the observed set; extra observed
/// functions carry no penalty.
fn check_functions(case: &TestCase, observation: &Observation, verdict: &mut Verdict) -> bool {
    if case.expected_functions.is_empty() {
        verdict.record(CheckKind::FunctionCoverage, true, "no expected functions declared");
        return true;
    }

    let mut all_present = true;
    for expected in &case.expected_functions {
        let wanted = expected.to_lowercase();
        let present = observation.functions.iter().any(|f| f.to_lowercase() == wanted);
        verdict.record(
            CheckKind::FunctionCoverage,
            present,
            if present {
                format!("function '{expected}' observed")
            } else {
                format!("function '{expected}' missing from {:?}", observation.functions)
            },
        );
        all_present &= present;
    }
    all_present
}

fn check_result(case: &TestCase, observation: &Observation, verdict: &mut Verdict) -> bool {
    let Some(expected) = &case.expected_result else {
        verdict.record(CheckKind::ResultMatch, true, "no expected result declared");
        return true;
    };

    let Some(observed) = &observation.result else {
        verdict.record(
            CheckKind::ResultMatch,
            false,
            format!("expected {expected:?} but no result was extracted"),
        );
        return false;
    };

    let matched = values_match(expected, observed);
    verdict.record(
        CheckKind::ResultMatch,
        matched,
        format!("expected {expected:?}, observed {observed}"),
    );
    matched
}

/// Compare an expectation against an extracted value by shape: numeric vs
/// numeric within [`NUMERIC_TOLERANCE`], list vs list by exact ordered
/// equality, booleans as 0/1 numerics, and any other pairing fails.
fn values_match(expected: &ExpectedValue, observed: &ExtractedValue) -> bool {
    match (expected, observed) {
        (ExpectedValue::List(want), ExtractedValue::List(got)) => want == got,
        (ExpectedValue::Bool(b), _) => observed
            .as_f64()
            .is_some_and(|got| (got - if *b { 1.0 } else { 0.0 }).abs() <= NUMERIC_TOLERANCE),
        (ExpectedValue::Int(n), _) => observed
            .as_f64()
            .is_some_and(|got| (got - *n as f64).abs() <= NUMERIC_TOLERANCE),
        (ExpectedValue::Float(x), _) => observed
            .as_f64()
            .is_some_and(|got| (got - x).abs() <= NUMERIC_TOLERANCE),
        // Keyed-map expectations have no extractable counterpart; a
        // non-map observation cannot satisfy them.
        (ExpectedValue::Map(_), _) => false,
        (ExpectedValue::List(_), _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complexity;

    fn observation(functions: &[&str], result: Option<ExtractedValue>) -> Observation {
        Observation {
            response: String::new(),
            functions: functions.iter().map(|s| s.to_string()).collect(),
            result,
        }
    }

    #[test]
    fn test_numeric_within_tolerance_passes() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::Int(15));
        let obs = observation(&[], Some(ExtractedValue::Float(15.000_000_1)));
        assert!(evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_numeric_outside_tolerance_fails() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::Int(15));
        let obs = observation(&[], Some(ExtractedValue::Float(15.01)));
        assert!(!evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_extra_observed_functions_tolerated() {
        let case = TestCase::new("t", "p", "c").expecting_functions(["gcd", "lcm"]);
        let obs = observation(&["gcd", "lcm", "sum"], None);
        assert!(evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_missing_expected_function_fails() {
        let case = TestCase::new("t", "p", "c").expecting_functions(["gcd", "lcm"]);
        let obs = observation(&["gcd"], None);
        let verdict = evaluate(&case, &obs, "");
        assert!(!verdict.passed);
        assert!(verdict
            .trail
            .iter()
            .any(|r| !r.passed && r.note.contains("'lcm' missing")));
    }

    #[test]
    fn test_function_check_case_insensitive() {
        let case = TestCase::new("t", "p", "c").expecting_functions(["GCD"]);
        let obs = observation(&["gcd"], None);
        assert!(evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_list_exact_ordered_equality() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::List(vec![2, 3, 3, 13]));
        let ok = observation(&[], Some(ExtractedValue::List(vec![2, 3, 3, 13])));
        assert!(evaluate(&case, &ok, "").passed);

        let reordered = observation(&[], Some(ExtractedValue::List(vec![3, 2, 3, 13])));
        assert!(!evaluate(&case, &reordered, "").passed);
    }

    #[test]
    fn test_null_observed_result_fails_when_expected() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::Int(120));
        let obs = observation(&["factorial"], None);
        assert!(!evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_expected_error_substring_case_insensitive() {
        let case = TestCase::new("t", "p", "c").expecting_error("ArgumentException");
        let obs = observation(&[], None);
        let verdict = evaluate(&case, &obs, "server raised argumentexception: bad input");
        assert!(verdict.passed);
        assert_eq!(verdict.trail.len(), 1);
        assert_eq!(verdict.trail[0].kind, CheckKind::ExpectedError);
    }

    #[test]
    fn test_expected_error_skips_other_checks() {
        // Even with wrong functions and no result, only the error signature matters.
        let case = TestCase::new("t", "p", "c")
            .expecting_error("overflow")
            .expecting_functions(["factorial"])
            .expecting_result(ExpectedValue::Int(1))
            .with_complexity(Complexity::Basic);
        let obs = observation(&[], None);
        let verdict = evaluate(&case, &obs, "factorial calculation OVERFLOW for 25");
        assert!(verdict.passed);
        assert_eq!(verdict.trail.len(), 1);
    }

    #[test]
    fn test_vacuous_checks_pass() {
        let case = TestCase::new("t", "p", "c");
        let obs = observation(&[], None);
        let verdict = evaluate(&case, &obs, "");
        assert!(verdict.passed);
        assert_eq!(verdict.trail.len(), 2);
        assert!(verdict.trail.iter().all(|r| r.passed));
    }

    #[test]
    fn test_bool_expectation_compares_as_zero_one() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::Bool(false));
        let obs = observation(&["is_prime"], Some(ExtractedValue::Int(0)));
        assert!(evaluate(&case, &obs, "").passed);

        let obs = observation(&["is_prime"], Some(ExtractedValue::Int(1)));
        assert!(!evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_map_expectation_never_matches_scalar() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("gcd".to_string(), 6.0);
        map.insert("lcm".to_string(), 36.0);
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::Map(map));
        let obs = observation(&["gcd", "lcm"], Some(ExtractedValue::Int(6)));
        assert!(!evaluate(&case, &obs, "").passed);
    }

    #[test]
    fn test_list_expectation_against_scalar_fails() {
        let case = TestCase::new("t", "p", "c").expecting_result(ExpectedValue::List(vec![3, 3, 11]));
        let obs = observation(&[], Some(ExtractedValue::Int(99)));
        assert!(!evaluate(&case, &obs, "").passed);
    }
}
