//! Incoming dataset model and delimited-text reading.
//!
//! One batch is one externally-sourced export consumed by a single
//! reconciliation run. Fields keep their source-native names; the column
//! mapping translates them to master columns inside the engine.
//!
//! Spreadsheet-container reading stays outside this crate; an external
//! reader constructs `IncomingBatch` directly and supplies `id_link` from
//! the source's ID-cell hyperlink where one exists.

use crate::error::{MergeError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One record from an external source batch. Ephemeral: consumed once per
/// run, never persisted.
#[derive(Debug, Clone, Default)]
pub struct IncomingRow {
    fields: HashMap<String, String>,
    /// Hyperlink carried by the source's identifier cell, if any.
    pub id_link: Option<String>,
}

impl IncomingRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_id_link(mut self, url: impl Into<String>) -> Self {
        self.id_link = Some(url.into());
        self
    }

    /// Field value by source-native name; empty values read as `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// One ordered incoming dataset.
#[derive(Debug, Clone, Default)]
pub struct IncomingBatch {
    pub headers: Vec<String>,
    pub rows: Vec<IncomingRow>,
}

impl IncomingBatch {
    /// Read a comma-delimited batch file. The first line names the fields.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBatch` for a file without a header line, or
    /// `BatchParse` for an unterminated quoted field.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut records = parse_records(&contents)?;
        if records.is_empty() {
            return Err(MergeError::EmptyBatch {
                path: path.to_path_buf(),
            });
        }

        let headers = records.remove(0);
        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = IncomingRow::new();
                for (i, value) in record.into_iter().enumerate() {
                    if let Some(name) = headers.get(i) {
                        row.fields.insert(name.clone(), value);
                    }
                }
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }
}

/// Parse quote-aware comma-delimited records.
///
/// Handles quoted fields containing commas, doubled quotes, and embedded
/// newlines. Mirrors the escaping rules of the CSV we emit elsewhere.
fn parse_records(contents: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;

    let mut chars = contents.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                if field.is_empty() {
                    in_quotes = true;
                } else {
                    field.push('"');
                }
            }
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                let done = std::mem::take(&mut record);
                if !(done.len() == 1 && done[0].is_empty()) {
                    records.push(done);
                }
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(MergeError::BatchParse {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        if !(record.len() == 1 && record[0].is_empty()) {
            records.push(record);
        }
    }

    Ok(records)
}
