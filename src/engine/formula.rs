//! Formula-column recomputation.
//!
//! After the per-row reconciliation pass, a fixed set of columns is
//! rewritten for every data row. Each is a pure function of other columns
//! in the same row, so the pass is idempotent and runs unconditionally
//! (no diffing, no markers except Top-issue handling).
//!
//! Two styles exist in the field: the master workbook historically holds
//! live spreadsheet formulas for the numeric columns, while grids with no
//! evaluating application behind them want the values materialized.

use super::columns;
use crate::grid::{Grid, HeaderIndex, column_letter};
use crate::model::{CellAddr, CellValue, CellWrite, FillMarker};
use crate::util::time::coerce_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Age in days after which a row counts as stale.
pub const STALE_THRESHOLD_DAYS: i64 = 20;

/// Tag substring marking a top-issue candidate.
pub const TOP_ISSUE_TAG: &str = "IPN_CN_TopIssue";

/// How formula columns are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormulaStyle {
    /// Emit spreadsheet formula strings (`=DATEDIF(...)` etc.).
    #[default]
    Spreadsheet,
    /// Compute literal values in the engine.
    Materialized,
}

/// Inputs for one recomputation pass.
#[derive(Debug)]
pub struct FormulaPass<'a> {
    pub headers: &'a HeaderIndex,
    pub style: FormulaStyle,
    /// Reference "now" for age computation; injected for determinism.
    pub now: DateTime<Utc>,
    /// Source key written into the source-tag column for appended rows.
    pub source_key: &'a str,
    /// Last data row before this run; rows beyond it up to
    /// `appended_last_row` are the appends.
    pub original_last_row: usize,
    /// Last row appended this run; bounds the source-tag writes.
    pub appended_last_row: usize,
    /// Marker applied when Top-issue promotes a row to "Yes".
    pub append_marker: FillMarker,
}

impl FormulaPass<'_> {
    /// Rewrite every formula column over rows `2..=last_row`, applying
    /// the writes to the grid and returning them. Callers pass the
    /// grid's physical extent, so rows holding stray data under a blank
    /// identifier are recomputed too. Top-issue evaluation runs last so
    /// its gray demotion wins within the run.
    pub fn run(&self, grid: &mut dyn Grid, last_row: usize) -> Vec<CellWrite> {
        let mut writes = Vec::new();

        self.age_in_days(grid, last_row, &mut writes);
        self.source_tag(&mut writes);
        self.stale_flag(grid, last_row, &mut writes);
        self.missing_target_flag(grid, last_row, &mut writes);
        self.rejected_flag(grid, last_row, &mut writes);

        for write in &writes {
            grid.apply(write);
        }

        let top_issue = self.top_issue(grid, last_row);
        for write in &top_issue {
            grid.apply(write);
        }
        writes.extend(top_issue);

        writes
    }

    fn age_in_days(&self, grid: &dyn Grid, last_row: usize, writes: &mut Vec<CellWrite>) {
        let Some(days_col) = self.headers.get(columns::DAYS) else {
            return;
        };
        let Some(created_col) = self.headers.get(columns::CREATION_TIME) else {
            return;
        };

        for row in 2..=last_row {
            let value = match self.style {
                FormulaStyle::Spreadsheet => {
                    let letter = column_letter(created_col);
                    CellValue::Formula(format!("=DATEDIF(${letter}{row},TODAY(),\"D\")"))
                }
                FormulaStyle::Materialized => {
                    match row_age_days(grid, row, created_col, self.now) {
                        Some(days) => CellValue::Number(days as f64),
                        None => continue,
                    }
                }
            };
            writes.push(CellWrite::value(CellAddr::new(row, days_col), value));
        }
    }

    fn source_tag(&self, writes: &mut Vec<CellWrite>) {
        let Some(col) = self.headers.get(columns::SOURCE_TAG) else {
            return;
        };
        for row in (self.original_last_row + 1)..=self.appended_last_row {
            writes.push(CellWrite::value(
                CellAddr::new(row, col),
                CellValue::text(self.source_key),
            ));
        }
    }

    fn stale_flag(&self, grid: &dyn Grid, last_row: usize, writes: &mut Vec<CellWrite>) {
        let Some(col) = self.headers.get_any(columns::OPEN_20_SPELLINGS) else {
            return;
        };
        let Some(days_col) = self.headers.get(columns::DAYS) else {
            return;
        };
        let Some(created_col) = self.headers.get(columns::CREATION_TIME) else {
            return;
        };

        for row in 2..=last_row {
            let value = match self.style {
                FormulaStyle::Spreadsheet => {
                    let letter = column_letter(days_col);
                    CellValue::Formula(format!("=IF({letter}{row}>{STALE_THRESHOLD_DAYS},1,0)"))
                }
                FormulaStyle::Materialized => {
                    match row_age_days(grid, row, created_col, self.now) {
                        Some(days) => flag_value(days > STALE_THRESHOLD_DAYS),
                        None => continue,
                    }
                }
            };
            writes.push(CellWrite::value(CellAddr::new(row, col), value));
        }
    }

    fn missing_target_flag(&self, grid: &dyn Grid, last_row: usize, writes: &mut Vec<CellWrite>) {
        let Some(col) = self.headers.get(columns::NO_TIS) else {
            return;
        };
        let Some(planned_col) = self.headers.get(columns::PLANNED_VERSION) else {
            return;
        };
        let Some(target_col) = self.headers.get_any(columns::TARGET_STEP_SPELLINGS) else {
            return;
        };

        for row in 2..=last_row {
            let value = match self.style {
                FormulaStyle::Spreadsheet => {
                    let p = column_letter(planned_col);
                    let t = column_letter(target_col);
                    CellValue::Formula(format!("=IF(OR({p}{row}<>\"\",{t}{row}<>\"\"),0,1)"))
                }
                FormulaStyle::Materialized => {
                    let both_empty = grid.value(row, planned_col).is_empty()
                        && grid.value(row, target_col).is_empty();
                    flag_value(both_empty)
                }
            };
            writes.push(CellWrite::value(CellAddr::new(row, col), value));
        }
    }

    fn rejected_flag(&self, grid: &dyn Grid, last_row: usize, writes: &mut Vec<CellWrite>) {
        let Some(col) = self.headers.get(columns::REJECTED) else {
            return;
        };
        let Some(blocking_col) = self.headers.get(columns::BLOCKING_REASON) else {
            return;
        };
        let Some(phase_col) = self.headers.get(columns::PHASE) else {
            return;
        };

        for row in 2..=last_row {
            let blocked = !grid.value(row, blocking_col).is_empty();
            let phase = grid.value(row, phase_col).display();
            let rejected = blocked && phase.contains(columns::NEW_SUBSTATE);
            writes.push(CellWrite::value(
                CellAddr::new(row, col),
                flag_value(rejected),
            ));
        }
    }

    /// Top-issue promotion and demotion.
    ///
    /// A row tagged `IPN_CN_TopIssue` gets "Yes" if the cell is empty.
    /// When the tag disappears, an existing "Yes" is demoted with the
    /// gray marker but never silently cleared.
    fn top_issue(&self, grid: &dyn Grid, last_row: usize) -> Vec<CellWrite> {
        let mut writes = Vec::new();
        let Some(tags_col) = self.headers.get(columns::TAGS) else {
            return writes;
        };
        let Some(top_col) = self.headers.get_any(columns::TOP_ISSUE_SPELLINGS) else {
            return writes;
        };

        for row in 2..=last_row {
            let tags = grid.value(row, tags_col).display();
            let current = grid.value(row, top_col);
            let addr = CellAddr::new(row, top_col);

            if tags.contains(TOP_ISSUE_TAG) {
                if current.is_empty() {
                    writes.push(CellWrite::marked(
                        addr,
                        CellValue::text("Yes"),
                        self.append_marker,
                    ));
                }
            } else if current.display() == "Yes" {
                writes.push(CellWrite::marked(addr, current, FillMarker::Demoted));
            }
        }
        writes
    }
}

/// 0/1 flag cell.
fn flag_value(set: bool) -> CellValue {
    CellValue::Number(if set { 1.0 } else { 0.0 })
}

/// Whole-day age of a row's creation timestamp against `now`.
fn row_age_days(
    grid: &dyn Grid,
    row: usize,
    created_col: usize,
    now: DateTime<Utc>,
) -> Option<i64> {
    let created = match grid.value(row, created_col) {
        CellValue::DateTime(dt) => dt,
        other => coerce_timestamp(&other.display())?,
    };
    Some((now.date_naive() - created.date_naive()).num_days())
}
