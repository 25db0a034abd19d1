//! Derived-field rule tables.
//!
//! A rule table maps free text to a derived value by case-insensitive
//! substring scan. Evaluation is short-circuiting over an ordered list:
//! first matching rule wins, so specific patterns must be listed before
//! general ones, and no match leaves the derived field untouched.

use crate::config::PatternRule;

/// Ordered pattern table ready for matching.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    value: String,
    patterns: Vec<String>,
}

impl RuleTable {
    /// Compile a table from config rules, lowercasing patterns once.
    #[must_use]
    pub fn new(rules: &[PatternRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                value: rule.value.clone(),
                patterns: rule.patterns.iter().map(|p| p.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Derived value for `text`, or `None` when no rule matches.
    #[must_use]
    pub fn apply(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.patterns
                    .iter()
                    .any(|p| !p.is_empty() && haystack.contains(p))
            })
            .map(|rule| rule.value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
