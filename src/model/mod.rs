//! Core value types for `trackmerge`.
//!
//! This module defines the types shared by the engine and the grid seam:
//! - `CellValue` - a scalar grid cell value
//! - `FillMarker` - per-run write provenance annotation on a cell
//! - `CellAddr` - 1-based cell address
//! - `CellWrite` - one cell mutation produced by the engine

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar cell value in the master grid.
///
/// `Formula` holds a spreadsheet formula string (leading `=`); the grid
/// accessor is responsible for how formulas are evaluated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    DateTime(DateTime<Utc>),
    Formula(String),
}

impl CellValue {
    /// True if the cell holds no value (empty text counts as empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the value as the string used for identity matching and
    /// value-level diffing.
    ///
    /// Whole numbers render without a trailing `.0` so a numeric `1001`
    /// in the grid matches a textual `"1001"` from a delimited batch.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::Formula(f) => f.clone(),
        }
    }

    /// Construct from a raw batch string, trimming nothing.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() { Self::Empty } else { Self::Text(s) }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Write-provenance annotation on a cell for the current run.
///
/// Exactly one marker is current per cell at settle time; the
/// highlight-reset pass clears all of them before the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMarker {
    /// Value changed on an existing row (light blue).
    Updated,
    /// Value written as part of a brand-new row (light green).
    Appended,
    /// Append marker used by the alternate run variant (pink).
    AppendedAlt,
    /// Top-issue demotion marker (gray).
    Demoted,
}

impl FillMarker {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Appended => "appended",
            Self::AppendedAlt => "appended-alt",
            Self::Demoted => "demoted",
        }
    }

    /// Canonical ARGB fill color for the external spreadsheet accessor.
    #[must_use]
    pub const fn argb(&self) -> &'static str {
        match self {
            Self::Updated => "FFADD8E6",
            Self::Appended => "FF8ED973",
            Self::AppendedAlt => "FFFFC0CB",
            Self::Demoted => "FFC0C0C0",
        }
    }
}

impl fmt::Display for FillMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 1-based cell address. Row 1 is the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: usize,
    pub col: usize,
}

impl CellAddr {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.col)
    }
}

/// One cell mutation decided by the engine.
///
/// Decision logic produces these; the grid accessor applies them. Keeping
/// the decision output as plain values lets the reconciliation paths be
/// unit-tested without any container I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWrite {
    pub addr: CellAddr,
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<FillMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

impl CellWrite {
    /// Plain value write with no marker or format.
    #[must_use]
    pub const fn value(addr: CellAddr, value: CellValue) -> Self {
        Self {
            addr,
            value,
            marker: None,
            number_format: None,
            hyperlink: None,
        }
    }

    /// Value write carrying a fill marker.
    #[must_use]
    pub const fn marked(addr: CellAddr, value: CellValue, marker: FillMarker) -> Self {
        Self {
            addr,
            value,
            marker: Some(marker),
            number_format: None,
            hyperlink: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_whole_number() {
        assert_eq!(CellValue::Number(1001.0).display(), "1001");
        assert_eq!(CellValue::Number(2.5).display(), "2.5");
    }

    #[test]
    fn test_empty_text_is_empty() {
        assert!(CellValue::text("").is_empty());
        assert!(CellValue::Empty.is_empty());
        assert!(!CellValue::text("x").is_empty());
    }

    #[test]
    fn test_cell_value_serde_round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 6, 20, 9, 30, 0).unwrap();
        let values = vec![
            CellValue::Empty,
            CellValue::text("hello"),
            CellValue::Number(42.0),
            CellValue::DateTime(dt),
            CellValue::Formula("=IF(A2>20,1,0)".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(values, back);
    }

    #[test]
    fn test_marker_colors() {
        assert_eq!(FillMarker::Updated.argb(), "FFADD8E6");
        assert_eq!(FillMarker::Appended.argb(), "FF8ED973");
        assert_eq!(FillMarker::Demoted.argb(), "FFC0C0C0");
    }

    #[test]
    fn test_cell_write_builders() {
        let w = CellWrite::marked(
            CellAddr::new(4, 1),
            CellValue::text("1001"),
            FillMarker::Appended,
        )
        .with_hyperlink("https://tracker/1001");
        assert_eq!(w.marker, Some(FillMarker::Appended));
        assert_eq!(w.hyperlink.as_deref(), Some("https://tracker/1001"));
        assert_eq!(w.addr.to_string(), "R4C1");
    }
}
