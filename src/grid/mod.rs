//! Grid accessor seam.
//!
//! The master dataset lives in an external spreadsheet container; the
//! engine only sees this module's `Grid` trait. `MemoryGrid` is the
//! in-process implementation used by the CLI (JSON-persisted) and the
//! test suite. An xlsx-backed accessor plugs in behind the same trait.

mod memory;

pub use memory::MemoryGrid;

use crate::error::{MergeError, Result};
use crate::model::{CellValue, CellWrite, FillMarker};
use std::collections::HashMap;

/// Addressable grid of cells. Rows and columns are 1-based; row 1 is the
/// header row naming columns.
pub trait Grid {
    /// Number of rows, counting trailing blank rows (like a sheet's
    /// max-row). At least 1 for a grid with a header.
    fn n_rows(&self) -> usize;

    /// Number of columns in the widest row.
    fn n_cols(&self) -> usize;

    /// Cell value; `Empty` for addresses outside current bounds.
    fn value(&self, row: usize, col: usize) -> CellValue;

    /// Set a cell value, growing the grid if needed.
    fn set_value(&mut self, row: usize, col: usize, value: CellValue);

    fn marker(&self, row: usize, col: usize) -> Option<FillMarker>;
    fn set_marker(&mut self, row: usize, col: usize, marker: FillMarker);
    fn clear_marker(&mut self, row: usize, col: usize);

    fn number_format(&self, row: usize, col: usize) -> Option<String>;
    fn set_number_format(&mut self, row: usize, col: usize, format: &str);

    fn hyperlink(&self, row: usize, col: usize) -> Option<String>;
    fn set_hyperlink(&mut self, row: usize, col: usize, url: &str);

    /// Remove a row entirely, shifting later rows up.
    fn delete_row(&mut self, row: usize);

    /// Apply one engine-produced cell write.
    fn apply(&mut self, write: &CellWrite) {
        let (row, col) = (write.addr.row, write.addr.col);
        self.set_value(row, col, write.value.clone());
        if let Some(marker) = write.marker {
            self.set_marker(row, col, marker);
        }
        if let Some(format) = &write.number_format {
            self.set_number_format(row, col, format);
        }
        if let Some(url) = &write.hyperlink {
            self.set_hyperlink(row, col, url);
        }
    }
}

/// Column lookup built from the header row.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    by_name: HashMap<String, usize>,
    names: Vec<String>,
}

impl HeaderIndex {
    /// Build the index from row 1. Blank header cells are skipped.
    pub fn build(grid: &dyn Grid) -> Self {
        let mut by_name = HashMap::new();
        let mut names = Vec::new();
        for col in 1..=grid.n_cols() {
            let name = grid.value(1, col).display();
            if !name.is_empty() {
                by_name.entry(name.clone()).or_insert(col);
            }
            names.push(name);
        }
        Self { by_name, names }
    }

    /// Column index for an exact header name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Column index for the first matching spelling.
    ///
    /// The master workbook has drifted spellings for a couple of headers
    /// ("Open >20 days" vs "Open > 20 days"); callers pass every known one.
    #[must_use]
    pub fn get_any(&self, spellings: &[&str]) -> Option<usize> {
        spellings.iter().find_map(|name| self.get(name))
    }

    /// Column index for a required header.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::MissingColumn` when absent; the identity and
    /// guard invariants cannot be established without it.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.get(name).ok_or_else(|| MergeError::MissingColumn {
            name: name.to_string(),
        })
    }

    /// Header names in column order (1-based column = index + 1).
    /// Blank headers are present as empty strings to keep positions.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// True if every cell in the row is empty.
#[must_use]
pub fn is_row_blank(grid: &dyn Grid, row: usize) -> bool {
    (1..=grid.n_cols()).all(|col| grid.value(row, col).is_empty())
}

/// Delete fully-blank rows at the bottom of the grid, stopping at the first
/// occupied row. Never touches the header row.
pub fn trim_trailing_blank_rows(grid: &mut dyn Grid) {
    let mut row = grid.n_rows();
    while row > 1 {
        if is_row_blank(grid, row) {
            grid.delete_row(row);
            row -= 1;
        } else {
            break;
        }
    }
}

/// Last row with a non-empty cell in `key_col`, scanning upward from the
/// bottom. Returns 1 (the header) when the column has no data, so the
/// first append lands on row 2.
#[must_use]
pub fn find_last_data_row(grid: &dyn Grid, key_col: usize) -> usize {
    for row in (2..=grid.n_rows()).rev() {
        if !grid.value(row, key_col).is_empty() {
            return row;
        }
    }
    1
}

/// Spreadsheet column letter for a 1-based column index (1 -> "A",
/// 27 -> "AA"). Used when emitting formula strings.
#[must_use]
pub fn column_letter(mut col: usize) -> String {
    debug_assert!(col >= 1);
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + u8::try_from(rem).unwrap_or(0));
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
