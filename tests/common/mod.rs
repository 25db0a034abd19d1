#![allow(dead_code)]

use std::collections::BTreeMap;
use trackmerge::config::{MergeConfig, PatternRule, SourceConfig};
use trackmerge::engine::formula::FormulaStyle;
use trackmerge::grid::MemoryGrid;

/// Master header row used across the scenario tests. Mirrors the layout
/// of a real tracking sheet, including the drifted Top-issue spelling.
pub const MASTER_HEADERS: &[&str] = &[
    "ID",                      // 1
    "Phase",                   // 2
    "Name",                    // 3
    "Owner",                   // 4
    "Creation time",           // 5
    "Found in function",       // 6
    "Function",                // 7
    "Root cause",              // 8
    "Involved I-Step",         // 9
    "Days",                    // 10
    "Open >20 days",           // 11
    "No TIS",                  // 12
    "Planned closing version", // 13
    "Target I-Step:",          // 14
    "Tags",                    // 15
    "Top issue Candidiate",    // 16
    "Octane or Jira",          // 17
    "Blocking reason",         // 18
    "Rejected ticket",         // 19
];

pub fn rule(value: &str, patterns: &[&str]) -> PatternRule {
    PatternRule {
        value: value.to_string(),
        patterns: patterns.iter().map(ToString::to_string).collect(),
    }
}

/// A Jira-flavored source: ID, Name, Owner, Phase, Found-in, Involved
/// I-Step mapped; "Created" is the coerced date column.
pub fn jira_source() -> SourceConfig {
    let mut mapping = BTreeMap::new();
    mapping.insert("Issue key".to_string(), "ID".to_string());
    mapping.insert("Summary".to_string(), "Name".to_string());
    mapping.insert("Assignee".to_string(), "Owner".to_string());
    mapping.insert("Status".to_string(), "Phase".to_string());
    mapping.insert("Component".to_string(), "Found in function".to_string());
    mapping.insert("Fix Step".to_string(), "Involved I-Step".to_string());
    mapping.insert("Created".to_string(), "Creation time".to_string());
    SourceConfig {
        mapping,
        date_col: Some("Created".to_string()),
        pattern: Some("jira".to_string()),
        clear_highlights: None,
    }
}

pub fn test_config() -> MergeConfig {
    let mut sources = BTreeMap::new();
    sources.insert("Jira".to_string(), jira_source());

    let mut config = MergeConfig {
        sources,
        function_rules: vec![
            rule("Fast charging", &["dc charge"]),
            rule("Charging", &["charge", "wallbox"]),
            rule("Navigation", &["nav", "route"]),
        ],
        root_cause_rules: vec![
            rule("Software", &["sw team", "firmware"]),
            rule("Integration", &["integration"]),
        ],
        ..MergeConfig::default()
    };
    config.settings.formula_style = FormulaStyle::Materialized;
    config.validate().expect("fixture config must validate");
    config
}

/// Three-row master grid over `MASTER_HEADERS`.
pub fn master_grid() -> MemoryGrid {
    let mut rows: Vec<Vec<&str>> = vec![MASTER_HEADERS.to_vec()];
    rows.push(make_row("2001", "New", "Existing defect", "alice"));
    rows.push(make_row("2002", "In Progress", "Another defect", "bob"));
    rows.push(make_row("2003", "Closed", "Finished defect", "carol"));
    let borrowed: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    MemoryGrid::from_text_rows(&borrowed)
}

fn make_row(id: &'static str, phase: &'static str, name: &'static str, owner: &'static str) -> Vec<&'static str> {
    let mut row = vec![""; MASTER_HEADERS.len()];
    row[0] = id;
    row[1] = phase;
    row[2] = name;
    row[3] = owner;
    row[4] = "2025-06-01T08:00:00Z";
    row
}
