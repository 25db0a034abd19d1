//! Record reconciliation engine.
//!
//! One run merges one incoming batch into the master grid:
//! highlight-reset pass, trailing-blank trim, identity index, then one
//! update-in-place / append / frozen-skip decision per incoming row,
//! and finally formula-column recomputation over the whole data range.
//!
//! The engine is synchronous and run-to-completion; the caller owns
//! serializing runs against one grid. A failed run leaves partial writes
//! in place (no rollback) and the caller decides whether to retry the
//! batch.

pub mod formula;
pub mod normalize;
pub mod rules;

use crate::batch::{IncomingBatch, IncomingRow};
use crate::config::{MergeConfig, SourceConfig};
use crate::error::Result;
use crate::grid::{Grid, HeaderIndex, find_last_data_row, trim_trailing_blank_rows};
use crate::model::{CellAddr, CellValue, CellWrite, FillMarker};
use crate::util::time::{DATE_DISPLAY_FORMAT, coerce_timestamp};
use chrono::{DateTime, Utc};
use formula::{FormulaPass, FormulaStyle};
use normalize::{is_step_column, normalize_step_id};
use rules::RuleTable;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Master-grid column names the engine knows about.
pub mod columns {
    /// Identity key column; required in every grid.
    pub const ID: &str = "ID";
    /// Status/phase column; required for the terminal-state guard.
    pub const PHASE: &str = "Phase";
    /// Derived-only function column, never mapped directly on update.
    pub const FUNCTION: &str = "Function";
    pub const ROOT_CAUSE: &str = "Root cause";
    pub const OWNER: &str = "Owner";
    pub const FOUND_IN: &str = "Found in function";
    pub const DAYS: &str = "Days";
    pub const CREATION_TIME: &str = "Creation time";
    pub const SOURCE_TAG: &str = "Octane or Jira";
    pub const NO_TIS: &str = "No TIS";
    pub const PLANNED_VERSION: &str = "Planned closing version";
    pub const TAGS: &str = "Tags";
    pub const BLOCKING_REASON: &str = "Blocking reason";
    pub const REJECTED: &str = "Rejected ticket";

    /// Header spellings that have drifted in the master workbook.
    pub const OPEN_20_SPELLINGS: &[&str] = &["Open >20 days", "Open > 20 days"];
    pub const TARGET_STEP_SPELLINGS: &[&str] = &["Target I-Step:", "Target I-Step"];
    pub const TOP_ISSUE_SPELLINGS: &[&str] = &["Top issue Candidate", "Top issue Candidiate"];

    /// Phase substring marking the "New" sub-state for rejected tickets.
    pub const NEW_SUBSTATE: &str = "New";

    /// Phase markers freezing a row against general updates.
    pub const TERMINAL_PHASES: &[&str] = &["Concluded", "Closed", "Resolved"];
}

/// Options for one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source key written into the source-tag column ("Jira"/"Octane").
    pub source_key: String,
    /// Whether the highlight-reset pass runs first.
    pub clear_highlights: bool,
    pub formula_style: FormulaStyle,
    /// Marker for appended cells (green or pink run variant).
    pub append_marker: FillMarker,
    /// Reference "now"; injected so age computation is deterministic.
    pub now: DateTime<Utc>,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub source: String,
    /// Rows taking the update path that changed at least one cell.
    pub updated_rows: usize,
    /// Brand-new rows appended.
    pub appended_rows: usize,
    /// Seen rows skipped by the terminal-state guard.
    pub skipped_frozen: usize,
    /// Incoming rows dropped for a missing/empty identifier.
    pub skipped_missing_id: usize,
    /// Cell writes from the update/append paths (markers applied).
    pub cells_written: usize,
    /// Formula cells rewritten (always the full range, never marked).
    pub formula_cells: usize,
    /// Every write applied this run, in application order.
    #[serde(skip)]
    pub writes: Vec<CellWrite>,
}

/// The reconciliation engine for one (source, grid) pairing.
///
/// All rule tables and mappings are explicit constructor inputs; there is
/// no ambient configuration.
#[derive(Debug)]
pub struct Reconciler<'a> {
    source: &'a SourceConfig,
    function_rules: RuleTable,
    root_cause_rules: RuleTable,
    options: RunOptions,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(source: &'a SourceConfig, config: &MergeConfig, options: RunOptions) -> Self {
        Self {
            source,
            function_rules: RuleTable::new(&config.function_rules),
            root_cause_rules: RuleTable::new(&config.root_cause_rules),
            options,
        }
    }

    /// Convenience constructor resolving a named source from the config.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSource` for an unconfigured source key.
    pub fn for_source(
        config: &'a MergeConfig,
        source_key: &str,
        clear_override: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let source = config.source(source_key)?;
        let options = RunOptions {
            source_key: source_key.to_string(),
            clear_highlights: config.clear_highlights_for(source, clear_override),
            formula_style: config.settings.formula_style,
            append_marker: config.settings.append_marker,
            now,
        };
        Ok(Self::new(source, config, options))
    }

    /// Reconcile one incoming batch into the grid.
    ///
    /// # Errors
    ///
    /// Fatal only when the identity/guard invariants cannot be
    /// established (missing `ID` or `Phase` header). Per-cell problems
    /// (unparseable dates, unmapped columns) are swallowed by design.
    /// On error the grid may hold partial writes; callers treat the
    /// persisted result as a write set needing verification.
    pub fn run(&self, grid: &mut dyn Grid, batch: &IncomingBatch) -> Result<RunReport> {
        let mut report = RunReport {
            source: self.options.source_key.clone(),
            ..RunReport::default()
        };

        info!(
            source = %self.options.source_key,
            rows = batch.rows.len(),
            "reconciliation run started"
        );

        if self.options.clear_highlights {
            clear_all_markers(grid);
        }
        trim_trailing_blank_rows(grid);

        let headers = HeaderIndex::build(grid);
        let id_col = headers.require(columns::ID)?;
        let phase_col = headers.require(columns::PHASE)?;

        let mut id_index = build_id_index(grid, id_col);
        let mut last_row = find_last_data_row(grid, id_col);
        let original_last = last_row;

        // id_field is guaranteed by config validation; an unvalidated
        // SourceConfig without one simply skips every row.
        let id_field = self.source.id_field().unwrap_or_default();

        for incoming in &batch.rows {
            let Some(new_id) = incoming.get(id_field) else {
                report.skipped_missing_id += 1;
                continue;
            };

            if let Some(&row) = id_index.get(new_id) {
                let phase = grid.value(row, phase_col).display();
                if is_terminal_phase(&phase) {
                    debug!(id = new_id, row, phase, "frozen row skipped");
                    report.skipped_frozen += 1;
                    continue;
                }
                let before = report.cells_written;
                self.update_row(grid, &headers, row, incoming, &mut report);
                if report.cells_written > before {
                    report.updated_rows += 1;
                }
            } else {
                last_row += 1;
                self.append_row(grid, &headers, id_col, last_row, new_id, incoming, &mut report);
                id_index.insert(new_id.to_string(), last_row);
                report.appended_rows += 1;
            }
        }

        // Recompute to the grid's physical extent, not the last ID row:
        // stray data under a blank identifier still gets its formula
        // columns refreshed.
        let formula_end = grid.n_rows();
        let formula_writes = FormulaPass {
            headers: &headers,
            style: self.options.formula_style,
            now: self.options.now,
            source_key: &self.options.source_key,
            original_last_row: original_last,
            appended_last_row: last_row,
            append_marker: self.options.append_marker,
        }
        .run(grid, formula_end);
        report.formula_cells = formula_writes.len();
        report.writes.extend(formula_writes);

        info!(
            updated = report.updated_rows,
            appended = report.appended_rows,
            frozen = report.skipped_frozen,
            "reconciliation run finished"
        );
        Ok(report)
    }

    /// Update path: mapped fields, value-level diff, then derived fields.
    fn update_row(
        &self,
        grid: &mut dyn Grid,
        headers: &HeaderIndex,
        row: usize,
        incoming: &IncomingRow,
        report: &mut RunReport,
    ) {
        // Designated date field first, coerced; failure keeps the prior value.
        if let Some(date_field) = self.source.date_col.as_deref()
            && let Some(raw) = incoming.get(date_field)
            && let Some(dt) = coerce_timestamp(raw)
            && let Some(master) = self.source.mapping.get(date_field)
            && let Some(col) = headers.get(master)
        {
            let new_value = CellValue::DateTime(dt);
            if grid.value(row, col) != new_value {
                apply(
                    grid,
                    report,
                    CellWrite::marked(CellAddr::new(row, col), new_value, FillMarker::Updated)
                        .with_format(DATE_DISPLAY_FORMAT),
                );
            }
        }

        // Remaining mapped fields. The date field was handled above;
        // Function is derived-only.
        for (incoming_field, master) in &self.source.mapping {
            if Some(incoming_field.as_str()) == self.source.date_col.as_deref()
                || master.as_str() == columns::FUNCTION
            {
                continue;
            }
            let Some(raw) = incoming.get(incoming_field) else {
                continue;
            };
            let value = if is_step_column(master) {
                normalize_step_id(raw)
            } else {
                raw.to_string()
            };
            let Some(col) = headers.get(master) else {
                continue;
            };
            if grid.value(row, col).display() != value {
                apply(
                    grid,
                    report,
                    CellWrite::marked(
                        CellAddr::new(row, col),
                        CellValue::text(value),
                        FillMarker::Updated,
                    ),
                );
            }
        }

        // Derived fields read the row's post-update text.
        self.apply_rule(grid, headers, row, RuleTarget::Function, FillMarker::Updated, report);
        self.apply_rule(grid, headers, row, RuleTarget::RootCause, FillMarker::Updated, report);
    }

    /// Append path: every master column gets a value (empty if unmapped).
    #[allow(clippy::too_many_arguments)]
    fn append_row(
        &self,
        grid: &mut dyn Grid,
        headers: &HeaderIndex,
        id_col: usize,
        row: usize,
        new_id: &str,
        incoming: &IncomingRow,
        report: &mut RunReport,
    ) {
        debug!(id = new_id, row, "appending new row");
        let date_target = self
            .source
            .date_col
            .as_deref()
            .and_then(|field| self.source.mapping.get(field));

        for (idx, header_name) in headers.names().iter().enumerate() {
            let col = idx + 1;
            let addr = CellAddr::new(row, col);

            let mapped = self
                .source
                .mapping
                .iter()
                .find(|(_, master)| master.as_str() == header_name.as_str())
                .and_then(|(field, _)| incoming.get(field));

            let Some(raw) = mapped else {
                // Unmapped or empty: blank cell, no marker.
                grid.set_value(row, col, CellValue::Empty);
                continue;
            };

            let is_date = Some(header_name) == date_target;
            let write = if is_date {
                // Coercion failure falls back to the raw text.
                coerce_timestamp(raw).map_or_else(
                    || {
                        CellWrite::marked(
                            addr,
                            CellValue::text(raw),
                            self.options.append_marker,
                        )
                    },
                    |dt| {
                        CellWrite::marked(
                            addr,
                            CellValue::DateTime(dt),
                            self.options.append_marker,
                        )
                        .with_format(DATE_DISPLAY_FORMAT)
                    },
                )
            } else {
                let value = if is_step_column(header_name) {
                    normalize_step_id(raw)
                } else {
                    raw.to_string()
                };
                CellWrite::marked(addr, CellValue::text(value), self.options.append_marker)
            };
            apply(grid, report, write);
        }

        // Carry the source's ID hyperlink onto the master identifier cell.
        if let Some(url) = &incoming.id_link {
            grid.set_hyperlink(row, id_col, url);
        }

        self.apply_rule(
            grid,
            headers,
            row,
            RuleTarget::Function,
            self.options.append_marker,
            report,
        );
        self.apply_rule(
            grid,
            headers,
            row,
            RuleTarget::RootCause,
            self.options.append_marker,
            report,
        );
    }

    /// Evaluate one derived-field rule table against the row's current
    /// text and write the result if it differs.
    fn apply_rule(
        &self,
        grid: &mut dyn Grid,
        headers: &HeaderIndex,
        row: usize,
        target: RuleTarget,
        marker: FillMarker,
        report: &mut RunReport,
    ) {
        let (table, scan_col_name, target_col_name) = match target {
            RuleTarget::Function => (&self.function_rules, columns::FOUND_IN, columns::FUNCTION),
            RuleTarget::RootCause => (&self.root_cause_rules, columns::OWNER, columns::ROOT_CAUSE),
        };
        let (Some(scan_col), Some(target_col)) =
            (headers.get(scan_col_name), headers.get(target_col_name))
        else {
            return;
        };

        let text = grid.value(row, scan_col).display();
        if let Some(derived) = table.apply(&text)
            && grid.value(row, target_col).display() != derived
        {
            apply(
                grid,
                report,
                CellWrite::marked(
                    CellAddr::new(row, target_col),
                    CellValue::text(derived),
                    marker,
                ),
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleTarget {
    Function,
    RootCause,
}

fn apply(grid: &mut dyn Grid, report: &mut RunReport, write: CellWrite) {
    grid.apply(&write);
    report.cells_written += 1;
    report.writes.push(write);
}

/// True if the phase text carries any terminal marker.
#[must_use]
pub fn is_terminal_phase(phase: &str) -> bool {
    columns::TERMINAL_PHASES.iter().any(|k| phase.contains(k))
}

/// Identifier -> row index over the existing grid. Empty identifier
/// cells are excluded: never referenced, never overwritten.
fn build_id_index(grid: &dyn Grid, id_col: usize) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for row in 2..=grid.n_rows() {
        let id = grid.value(row, id_col).display();
        if !id.is_empty() {
            index.insert(id, row);
        }
    }
    index
}

fn clear_all_markers(grid: &mut dyn Grid) {
    for row in 2..=grid.n_rows() {
        for col in 1..=grid.n_cols() {
            grid.clear_marker(row, col);
        }
    }
}
