//! Error types and handling for `trackmerge`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for wrapped collaborator errors
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `trackmerge` operations.
#[derive(Error, Debug)]
pub enum MergeError {
    // === Grid Errors ===
    /// Grid file not found at the specified path.
    #[error("Grid not found at '{path}'")]
    GridNotFound { path: PathBuf },

    /// A required header column is missing from the master grid.
    ///
    /// Without the identity and guard columns the run cannot establish
    /// its invariants, so this is fatal.
    #[error("Required column not found in header row: {name}")]
    MissingColumn { name: String },

    // === Batch Errors ===
    /// Failed to parse a line in a delimited-text batch.
    #[error("Batch parse error at line {line}: {reason}")]
    BatchParse { line: usize, reason: String },

    /// Incoming batch has no header row.
    #[error("Batch file is empty: {path}")]
    EmptyBatch { path: PathBuf },

    // === Source / Mapping Errors ===
    /// The requested source key has no configuration.
    #[error("Unknown source: {name}")]
    UnknownSource { name: String },

    /// No configured source pattern matches the batch filename.
    #[error("Cannot detect source for '{filename}'")]
    SourceNotDetected { filename: String },

    /// A source mapping violates the identity key contract.
    ///
    /// The field is `source_key` rather than `source` because thiserror
    /// reserves `source` for the error-chain cause.
    #[error("Source '{source_key}' mapping does not target the ID column")]
    MappingWithoutId { source_key: String },

    /// Two incoming fields map to the same master column.
    #[error("Source '{source_key}' maps multiple fields to column '{column}'")]
    DuplicateMappingTarget { source_key: String, column: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Config file not found at '{path}'")]
    ConfigNotFound { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Wrapped errors ===
    /// Wrapped anyhow error from an external collaborator.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MergeError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::GridNotFound { .. }
                | Self::ConfigNotFound { .. }
                | Self::MissingColumn { .. }
                | Self::UnknownSource { .. }
                | Self::SourceNotDetected { .. }
                | Self::MappingWithoutId { .. }
                | Self::DuplicateMappingTarget { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::GridNotFound { .. } => Some("Check paths.grid_file in the config"),
            Self::ConfigNotFound { .. } => {
                Some("Pass --config or set TRACKMERGE_CONFIG to the config file path")
            }
            Self::MissingColumn { .. } => {
                Some("The master grid header row must contain 'ID' and 'Phase' columns")
            }
            Self::UnknownSource { .. } => Some("Declare the source under 'sources' in the config"),
            Self::SourceNotDetected { .. } => {
                Some("Pass --source explicitly or add a filename 'pattern' to a source")
            }
            Self::MappingWithoutId { .. } => {
                Some("Every source mapping must map some incoming field to 'ID'")
            }
            Self::DuplicateMappingTarget { .. } => {
                Some("Remove the duplicate mapping entry; master columns take one source field")
            }
            _ => None,
        }
    }

    /// Create a config error from any displayable reason.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

/// Result type using `MergeError`.
pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MergeError::MissingColumn {
            name: "ID".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Required column not found in header row: ID"
        );
    }

    #[test]
    fn test_user_recoverable() {
        let recoverable = MergeError::UnknownSource {
            name: "Bugzilla".to_string(),
        };
        assert!(recoverable.is_user_recoverable());

        let not_recoverable = MergeError::Io(std::io::Error::other("disk gone"));
        assert!(!not_recoverable.is_user_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = MergeError::MappingWithoutId {
            source_key: "Jira".to_string(),
        };
        assert_eq!(
            err.suggestion(),
            Some("Every source mapping must map some incoming field to 'ID'")
        );

        let err = MergeError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(err.suggestion(), None);
    }
}
