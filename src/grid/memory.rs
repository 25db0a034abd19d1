//! In-memory grid with JSON persistence.

use super::Grid;
use crate::error::{MergeError, Result};
use crate::model::{CellValue, FillMarker};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One stored cell: value plus the annotations the accessor carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default, skip_serializing_if = "CellValue::is_empty")]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<FillMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// In-memory `Grid` implementation.
///
/// Backing store for the CLI (persisted as a JSON document) and for unit
/// tests. Rows grow on demand when the engine writes past the current
/// bounds, mirroring how a worksheet extends itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGrid {
    rows: Vec<Vec<Cell>>,
}

impl MemoryGrid {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a grid of text cells; row 0 of the slice becomes the header.
    /// Empty strings become empty cells.
    #[must_use]
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|text| Cell {
                        value: CellValue::text(*text),
                        ..Cell::default()
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Load a grid from its JSON file.
    ///
    /// # Errors
    ///
    /// Returns `GridNotFound` if the file does not exist, or a JSON error
    /// if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MergeError::GridNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist the grid to its JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows.get(row - 1).and_then(|r| r.get(col - 1))
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        debug_assert!(row >= 1 && col >= 1);
        if self.rows.len() < row {
            self.rows.resize(row, Vec::new());
        }
        let stored = &mut self.rows[row - 1];
        if stored.len() < col {
            stored.resize(col, Cell::default());
        }
        &mut stored[col - 1]
    }
}

impl Grid for MemoryGrid {
    fn n_rows(&self) -> usize {
        self.rows.len().max(1)
    }

    fn n_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn value(&self, row: usize, col: usize) -> CellValue {
        self.cell(row, col)
            .map_or(CellValue::Empty, |c| c.value.clone())
    }

    fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        self.cell_mut(row, col).value = value;
    }

    fn marker(&self, row: usize, col: usize) -> Option<FillMarker> {
        self.cell(row, col).and_then(|c| c.marker)
    }

    fn set_marker(&mut self, row: usize, col: usize, marker: FillMarker) {
        self.cell_mut(row, col).marker = Some(marker);
    }

    fn clear_marker(&mut self, row: usize, col: usize) {
        if row >= 1
            && col >= 1
            && let Some(stored) = self.rows.get_mut(row - 1)
            && let Some(cell) = stored.get_mut(col - 1)
        {
            cell.marker = None;
        }
    }

    fn number_format(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).and_then(|c| c.format.clone())
    }

    fn set_number_format(&mut self, row: usize, col: usize, format: &str) {
        self.cell_mut(row, col).format = Some(format.to_string());
    }

    fn hyperlink(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).and_then(|c| c.link.clone())
    }

    fn set_hyperlink(&mut self, row: usize, col: usize, url: &str) {
        self.cell_mut(row, col).link = Some(url.to_string());
    }

    fn delete_row(&mut self, row: usize) {
        if row >= 1 && row <= self.rows.len() {
            self.rows.remove(row - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellAddr, CellWrite};
    use tempfile::TempDir;

    #[test]
    fn test_grows_on_write() {
        let mut grid = MemoryGrid::new();
        grid.set_value(3, 2, CellValue::text("x"));
        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.n_cols(), 2);
        assert_eq!(grid.value(3, 2).display(), "x");
        assert!(grid.value(1, 1).is_empty());
    }

    #[test]
    fn test_marker_lifecycle() {
        let mut grid = MemoryGrid::new();
        grid.set_marker(2, 1, FillMarker::Updated);
        assert_eq!(grid.marker(2, 1), Some(FillMarker::Updated));
        grid.clear_marker(2, 1);
        assert_eq!(grid.marker(2, 1), None);
        // Clearing out of bounds is a no-op.
        grid.clear_marker(50, 50);
    }

    #[test]
    fn test_delete_row_shifts_up() {
        let mut grid = MemoryGrid::from_text_rows(&[&["ID"], &["1"], &["2"]]);
        grid.delete_row(2);
        assert_eq!(grid.n_rows(), 2);
        assert_eq!(grid.value(2, 1).display(), "2");
    }

    #[test]
    fn test_apply_write() {
        let mut grid = MemoryGrid::new();
        let write = CellWrite::marked(
            CellAddr::new(2, 3),
            CellValue::text("Bar"),
            FillMarker::Updated,
        )
        .with_format("m/d/yyyy h:mm:ss AM/PM");
        grid.apply(&write);
        assert_eq!(grid.value(2, 3).display(), "Bar");
        assert_eq!(grid.marker(2, 3), Some(FillMarker::Updated));
        assert!(grid.number_format(2, 3).is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.json");

        let mut grid = MemoryGrid::from_text_rows(&[&["ID", "Name"], &["1", "alpha"]]);
        grid.set_marker(2, 2, FillMarker::Appended);
        grid.set_hyperlink(2, 1, "https://tracker/1");
        grid.save(&path).unwrap();

        let back = MemoryGrid::load(&path).unwrap();
        assert_eq!(back.value(2, 2).display(), "alpha");
        assert_eq!(back.marker(2, 2), Some(FillMarker::Appended));
        assert_eq!(back.hyperlink(2, 1).as_deref(), Some("https://tracker/1"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = MemoryGrid::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MergeError::GridNotFound { .. }));
    }
}
