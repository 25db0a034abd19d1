//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::MergeError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Grid Errors (exit code 2) ===
    /// Grid file not found
    GridNotFound,
    /// Required header column missing
    MissingColumn,

    // === Batch Errors (exit code 3) ===
    /// Delimited-text parse error
    BatchParseError,
    /// Batch file has no header row
    EmptyBatch,

    // === Source / Mapping Errors (exit code 4) ===
    /// Source key has no configuration
    UnknownSource,
    /// No source pattern matched the filename
    SourceNotDetected,
    /// Mapping does not target the ID column
    MappingWithoutId,
    /// Duplicate mapping target
    DuplicateMappingTarget,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,
    /// Config file not found
    ConfigNotFound,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GridNotFound => "GRID_NOT_FOUND",
            Self::MissingColumn => "MISSING_COLUMN",
            Self::BatchParseError => "BATCH_PARSE_ERROR",
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::UnknownSource => "UNKNOWN_SOURCE",
            Self::SourceNotDetected => "SOURCE_NOT_DETECTED",
            Self::MappingWithoutId => "MAPPING_WITHOUT_ID",
            Self::DuplicateMappingTarget => "DUPLICATE_MAPPING_TARGET",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable after fixing the input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnknownSource
                | Self::SourceNotDetected
                | Self::MappingWithoutId
                | Self::DuplicateMappingTarget
                | Self::BatchParseError
        )
    }

    /// Get the exit code for this error category.
    ///
    /// Exit codes are grouped by error category:
    /// - 1: Internal/unknown errors
    /// - 2: Grid errors
    /// - 3: Batch errors
    /// - 4: Source/mapping errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::GridNotFound | Self::MissingColumn => 2,
            Self::BatchParseError | Self::EmptyBatch => 3,
            Self::UnknownSource
            | Self::SourceNotDetected
            | Self::MappingWithoutId
            | Self::DuplicateMappingTarget => 4,
            Self::ConfigError | Self::ConfigNotFound => 7,
            Self::IoError | Self::JsonError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `MergeError`.
    #[must_use]
    pub fn from_error(err: &MergeError) -> Self {
        let (code, context) = extract_code_and_context(err);
        let hint = err.suggestion().map(str::to_string);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Convert to a JSON value for output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }
}

fn extract_code_and_context(err: &MergeError) -> (ErrorCode, Option<Value>) {
    match err {
        MergeError::GridNotFound { path } => (
            ErrorCode::GridNotFound,
            Some(json!({ "path": path.display().to_string() })),
        ),
        MergeError::MissingColumn { name } => {
            (ErrorCode::MissingColumn, Some(json!({ "column": name })))
        }
        MergeError::BatchParse { line, reason } => (
            ErrorCode::BatchParseError,
            Some(json!({ "line": line, "reason": reason })),
        ),
        MergeError::EmptyBatch { path } => (
            ErrorCode::EmptyBatch,
            Some(json!({ "path": path.display().to_string() })),
        ),
        MergeError::UnknownSource { name } => {
            (ErrorCode::UnknownSource, Some(json!({ "source": name })))
        }
        MergeError::SourceNotDetected { filename } => (
            ErrorCode::SourceNotDetected,
            Some(json!({ "filename": filename })),
        ),
        MergeError::MappingWithoutId { source_key } => (
            ErrorCode::MappingWithoutId,
            Some(json!({ "source": source_key })),
        ),
        MergeError::DuplicateMappingTarget { source_key, column } => (
            ErrorCode::DuplicateMappingTarget,
            Some(json!({ "source": source_key, "column": column })),
        ),
        MergeError::Config(_) => (ErrorCode::ConfigError, None),
        MergeError::ConfigNotFound { path } => (
            ErrorCode::ConfigNotFound,
            Some(json!({ "path": path.display().to_string() })),
        ),
        MergeError::Io(_) => (ErrorCode::IoError, None),
        MergeError::Json(_) => (ErrorCode::JsonError, None),
        MergeError::Other(_) => (ErrorCode::InternalError, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_missing_column() {
        let err = MergeError::MissingColumn {
            name: "Phase".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::MissingColumn);
        assert!(!structured.retryable);
        assert_eq!(structured.code.exit_code(), 2);
        assert_eq!(
            structured.context,
            Some(json!({ "column": "Phase" }))
        );
    }

    #[test]
    fn test_mapping_errors_construct_and_keep_context_key() {
        // The variant field is source_key; the emitted context key stays
        // "source" for scripted consumers.
        let err = MergeError::MappingWithoutId {
            source_key: "Jira".to_string(),
        };
        assert!(err.to_string().contains("Jira"));
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::MappingWithoutId);
        assert_eq!(structured.context, Some(json!({ "source": "Jira" })));

        let err = MergeError::DuplicateMappingTarget {
            source_key: "Octane".to_string(),
            column: "Name".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(
            structured.context,
            Some(json!({ "source": "Octane", "column": "Name" }))
        );
    }

    #[test]
    fn test_to_json_shape() {
        let err = MergeError::UnknownSource {
            name: "Bugzilla".to_string(),
        };
        let json = StructuredError::from_error(&err).to_json();
        assert_eq!(json["error"]["code"], "UNKNOWN_SOURCE");
        assert_eq!(json["error"]["retryable"], true);
    }

    #[test]
    fn test_to_human_with_hint() {
        let err = MergeError::SourceNotDetected {
            filename: "export.csv".to_string(),
        };
        let human = StructuredError::from_error(&err).to_human(false);
        assert!(human.starts_with("Error: "));
        assert!(human.contains("Hint: "));
    }

    #[test]
    fn test_exit_code_grouping() {
        assert_eq!(ErrorCode::InternalError.exit_code(), 1);
        assert_eq!(ErrorCode::ConfigError.exit_code(), 7);
        assert_eq!(ErrorCode::IoError.exit_code(), 8);
    }
}
