//! Configuration for `trackmerge`.
//!
//! One JSON config file declares the sources (column mappings plus the
//! optional date column), the two derived-field rule tables, and run
//! settings. Everything is explicit values handed to the engine at
//! construction; there is no ambient global state, so tests run against
//! fixture configs without file I/O.
//!
//! Config path precedence (highest wins):
//! 1. `--config` CLI flag
//! 2. `TRACKMERGE_CONFIG` environment variable
//! 3. `./trackmerge.json`

use crate::engine::formula::FormulaStyle;
use crate::error::{MergeError, Result};
use crate::model::FillMarker;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "trackmerge.json";

/// Master column every source mapping must target.
pub const ID_COLUMN: &str = "ID";

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Source key (e.g. "Jira", "Octane") to its mapping rule.
    pub sources: BTreeMap<String, SourceConfig>,

    /// Found-in-text -> function rule table. Order is significant:
    /// first match wins, so specific patterns go before general ones.
    #[serde(default)]
    pub function_rules: Vec<PatternRule>,

    /// Owner-text -> root-cause rule table. Same ordering contract.
    #[serde(default)]
    pub root_cause_rules: Vec<PatternRule>,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub paths: Paths,
}

/// Per-source column mapping rule.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Incoming-field name -> master-column name.
    pub mapping: BTreeMap<String, String>,

    /// Incoming field requiring timestamp coercion and the date display
    /// format, if this source carries one.
    #[serde(default)]
    pub date_col: Option<String>,

    /// Filename substring used to detect this source for ad-hoc runs.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Per-source override for the highlight-reset pass.
    #[serde(default)]
    pub clear_highlights: Option<bool>,
}

impl SourceConfig {
    /// The incoming field mapped to the master `ID` column.
    #[must_use]
    pub fn id_field(&self) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, master)| master.as_str() == ID_COLUMN)
            .map(|(incoming, _)| incoming.as_str())
    }
}

/// One derived-field rule: any listed pattern appearing in the scanned
/// text (case-insensitive substring) yields `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
    pub value: String,
    pub patterns: Vec<String>,
}

/// Run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Whether the highlight-reset pass runs before reconciliation.
    /// Overridable per source and again from the CLI.
    #[serde(default = "default_true")]
    pub clear_highlights: bool,

    /// How formula columns are rewritten: spreadsheet formula strings or
    /// materialized values.
    #[serde(default)]
    pub formula_style: FormulaStyle,

    /// Marker used for appended cells; the pink variant distinguishes
    /// runs of the alternate source on shared dashboards.
    #[serde(default = "default_append_marker")]
    pub append_marker: FillMarker,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clear_highlights: true,
            formula_style: FormulaStyle::default(),
            append_marker: FillMarker::Appended,
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_append_marker() -> FillMarker {
    FillMarker::Appended
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paths {
    /// JSON-persisted master grid.
    #[serde(default = "default_grid_file")]
    pub grid_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            grid_file: default_grid_file(),
        }
    }
}

fn default_grid_file() -> PathBuf {
    PathBuf::from("master_grid.json")
}

impl MergeConfig {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` for a missing file, a JSON error for a
    /// malformed one, or a validation error for a config that breaks the
    /// identity-key or mapping contracts.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MergeError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate mapping contracts without touching the filesystem.
    ///
    /// # Errors
    ///
    /// - `MappingWithoutId`: a source maps nothing to `ID`
    /// - `DuplicateMappingTarget`: two incoming fields target one column
    /// - `Config`: a declared `date_col` is not a mapping key, or the
    ///   append marker is not an append variant
    pub fn validate(&self) -> Result<()> {
        for (name, source) in &self.sources {
            if source.id_field().is_none() {
                return Err(MergeError::MappingWithoutId {
                    source_key: name.clone(),
                });
            }

            let mut seen = HashSet::new();
            for master in source.mapping.values() {
                if !seen.insert(master.as_str()) {
                    return Err(MergeError::DuplicateMappingTarget {
                        source_key: name.clone(),
                        column: master.clone(),
                    });
                }
            }

            if let Some(date_col) = &source.date_col
                && !source.mapping.contains_key(date_col)
            {
                return Err(MergeError::config(format!(
                    "source '{name}': date_col '{date_col}' is not a mapping key"
                )));
            }
        }

        if !matches!(
            self.settings.append_marker,
            FillMarker::Appended | FillMarker::AppendedAlt
        ) {
            return Err(MergeError::config(format!(
                "settings.append_marker must be an append variant, got '{}'",
                self.settings.append_marker
            )));
        }

        Ok(())
    }

    /// Look up a source by key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSource` when the key is not configured.
    pub fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .get(name)
            .ok_or_else(|| MergeError::UnknownSource {
                name: name.to_string(),
            })
    }

    /// Detect the source for a batch filename via configured patterns.
    ///
    /// Matching is a case-insensitive substring test, the way the watcher
    /// layer routes files dropped into per-source directories.
    ///
    /// # Errors
    ///
    /// Returns `SourceNotDetected` when no pattern matches.
    pub fn detect_source(&self, filename: &str) -> Result<&str> {
        let lower = filename.to_lowercase();
        self.sources
            .iter()
            .find(|(_, source)| {
                source
                    .pattern
                    .as_ref()
                    .is_some_and(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
            })
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| MergeError::SourceNotDetected {
                filename: filename.to_string(),
            })
    }

    /// Resolve whether this run clears highlights before reconciling.
    /// CLI override beats the per-source override, which beats the
    /// global setting.
    #[must_use]
    pub fn clear_highlights_for(&self, source: &SourceConfig, cli: Option<bool>) -> bool {
        cli.or(source.clear_highlights)
            .unwrap_or(self.settings.clear_highlights)
    }
}

/// Resolve the config file path from the CLI flag, the environment, or
/// the default filename.
///
/// # Errors
///
/// Returns `ConfigNotFound` when nothing resolves to an existing file.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(value) = env::var("TRACKMERGE_CONFIG")
        && !value.trim().is_empty()
    {
        return Ok(PathBuf::from(value));
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILENAME);
    if default.is_file() {
        Ok(default)
    } else {
        Err(MergeError::ConfigNotFound { path: default })
    }
}
