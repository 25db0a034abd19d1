//! Involved-step identifier normalization.
//!
//! Incoming exports render the involved integration step several ways:
//! legacy `G070`/`U006` prefixed identifiers, or free text carrying the
//! step code in parentheses (ASCII or full-width), e.g.
//! `（25-07-452 ATS+3 ...）`. Master rows store one canonical spelling
//! with the `NA05` prefix.

use once_cell::sync::Lazy;
use regex::Regex;

/// Legacy step-id prefixes rewritten to the target prefix.
const LEGACY_PREFIXES: [&str; 2] = ["G070", "U006"];

/// Canonical step-id prefix.
const TARGET_PREFIX: &str = "NA05";

/// Parenthesized step code: first alphanumeric-and-hyphen run after an
/// opening ASCII or full-width parenthesis.
static PAREN_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[（(]([0-9A-Za-z-]+)").expect("valid regex"));

/// Normalize an involved-step identifier to the `NA05` spelling.
///
/// Rules, first match wins:
/// 1. A value already carrying the target prefix is returned as-is,
///    which makes normalization idempotent.
/// 2. A legacy prefix (`G070`/`U006`) is replaced in place, preserving
///    the remainder: `G070-123` -> `NA05-123`.
/// 3. A parenthesized code is extracted and rewritten:
///    `（25-07-452 ATS+3）` -> `NA05-25-07-452`.
/// 4. Anything else passes through unchanged.
#[must_use]
pub fn normalize_step_id(raw: &str) -> String {
    if raw.starts_with(TARGET_PREFIX) {
        return raw.to_string();
    }

    for prefix in LEGACY_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return format!("{TARGET_PREFIX}{rest}");
        }
    }

    if let Some(captures) = PAREN_CODE.captures(raw) {
        return format!("{TARGET_PREFIX}-{}", &captures[1]);
    }

    raw.to_string()
}

/// True if `master_column` is the involved-step column (with or without
/// the trailing colon the workbook header has carried historically).
#[must_use]
pub fn is_step_column(master_column: &str) -> bool {
    master_column.trim_end_matches(':').trim() == "Involved I-Step"
}
