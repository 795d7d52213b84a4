//! Property-based tests for response interpretation using proptest.

use proptest::prelude::*;

use agentmark_core::{KNOWN_FUNCTIONS, Language, extract_functions, extract_result};
use agentmark_core::nearest_rank_percentile;

proptest! {
    // Extraction never panics and only ever reports known names, once
    // each, regardless of the response text.
    #[test]
    fn extract_functions_yields_known_names_without_duplicates(response in ".{0,200}") {
        let functions = extract_functions(&response);
        let mut seen = std::collections::HashSet::new();
        for name in &functions {
            prop_assert!(KNOWN_FUNCTIONS.contains(&name.as_str()), "unknown name {name}");
            prop_assert!(seen.insert(name.clone()), "duplicate name {name}");
        }
    }

    #[test]
    fn extract_result_never_panics(response in ".{0,200}") {
        let _ = extract_result(&response);
    }

    // Embedding a vocabulary name verbatim guarantees it is reported.
    #[test]
    fn embedded_vocabulary_name_is_always_found(
        index in 0..KNOWN_FUNCTIONS.len(),
        prefix in "[a-zA-Z ]{0,20}",
        suffix in "[a-zA-Z ]{0,20}",
    ) {
        let name = KNOWN_FUNCTIONS[index];
        let response = format!("{prefix} {name} {suffix}");
        prop_assert!(extract_functions(&response).iter().any(|f| f == name));
    }

    // A lone unsigned integer in otherwise unparseable text is still
    // recovered by the last-resort stage.
    #[test]
    fn bare_integer_is_recovered(n in 0i64..1_000_000) {
        let result = extract_result(&format!("よくわからないが {n} かもしれない"));
        let value = result.expect("integer present");
        prop_assert!((value.as_f64().unwrap() - n as f64).abs() < 1e-9);
    }

    #[test]
    fn ascii_text_is_never_japanese(text in "[ -~]{0,100}") {
        prop_assert_ne!(Language::detect(&text), Language::Japanese);
    }

    // Percentiles of a nonempty sample always fall inside its range.
    #[test]
    fn percentile_stays_within_sample_range(
        mut data in proptest::collection::vec(0.0f64..1000.0, 1..200),
        percentile in 0.0f64..100.0,
    ) {
        let value = nearest_rank_percentile(&data, percentile);
        data.sort_by(|a, b| a.partial_cmp(b).unwrap());
        prop_assert!(value >= data[0] && value <= data[data.len() - 1]);
    }
}
