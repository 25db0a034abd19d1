//! Property tests for step-id normalization and rule-table matching.

use proptest::prelude::*;
use trackmerge::config::PatternRule;
use trackmerge::engine::normalize::normalize_step_id;
use trackmerge::engine::rules::RuleTable;

proptest! {
    /// Normalization must be idempotent for any input, not just the
    /// known shapes: re-running a settled grid through the engine must
    /// never rewrite a step cell.
    #[test]
    fn normalize_is_idempotent(raw in ".{0,60}") {
        let once = normalize_step_id(&raw);
        prop_assert_eq!(normalize_step_id(&once), once);
    }

    /// Legacy-prefixed identifiers always come out with the canonical
    /// prefix and an unchanged remainder.
    #[test]
    fn legacy_prefix_preserves_remainder(rest in "[0-9-]{0,20}") {
        for prefix in ["G070", "U006"] {
            let normalized = normalize_step_id(&format!("{prefix}{rest}"));
            prop_assert_eq!(normalized, format!("NA05{rest}"));
        }
    }

    /// The extracted parenthesized code never contains characters outside
    /// the code alphabet.
    #[test]
    fn paren_extraction_yields_clean_code(code in "[0-9A-Za-z-]{1,16}", tail in "[ a-z+]{0,12}") {
        let normalized = normalize_step_id(&format!("({code}{tail})"));
        prop_assert!(normalized.starts_with("NA05-"));
        let extracted = &normalized["NA05-".len()..];
        prop_assert!(extracted.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        prop_assert!(code.starts_with(extracted) || extracted.starts_with(&code));
    }

    /// Rule matching is case-insensitive: the same text upper- or
    /// lower-cased resolves to the same derived value.
    #[test]
    fn rule_match_is_case_insensitive(text in "[a-zA-Z ]{0,30}") {
        let table = RuleTable::new(&[
            PatternRule { value: "Charging".into(), patterns: vec!["charge".into()] },
            PatternRule { value: "Navigation".into(), patterns: vec!["nav".into()] },
        ]);
        prop_assert_eq!(table.apply(&text.to_uppercase()), table.apply(&text.to_lowercase()));
    }

    /// Earlier rules always shadow later ones on overlapping patterns.
    #[test]
    fn rule_order_decides_overlap(text in "[a-z ]{0,30}") {
        let specific = PatternRule { value: "Fast charging".into(), patterns: vec!["charge".into()] };
        let general = PatternRule { value: "Charging".into(), patterns: vec!["charge".into()] };
        let table = RuleTable::new(&[specific, general]);
        if let Some(derived) = table.apply(&text) {
            prop_assert_eq!(derived, "Fast charging");
        }
    }
}
