//! `tm run`: reconcile one incoming batch into the master grid.

use crate::batch::IncomingBatch;
use crate::cli::RunArgs;
use crate::config::{MergeConfig, resolve_config_path};
use crate::engine::Reconciler;
use crate::error::{MergeError, Result};
use crate::grid::MemoryGrid;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

pub fn execute(args: &RunArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;
    let config = MergeConfig::load(&config_path)?;

    let source_key = match &args.source {
        Some(key) => {
            config.source(key)?;
            key.clone()
        }
        None => {
            let filename = args
                .batch
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            config.detect_source(&filename)?.to_string()
        }
    };

    let grid_path = args.grid.as_deref().unwrap_or(&config.paths.grid_file);
    let mut grid = MemoryGrid::load(grid_path)?;
    let batch = IncomingBatch::read_csv(&args.batch)?;

    let now = match &args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MergeError::config(format!("invalid --now value '{raw}': {e}")))?,
        None => Utc::now(),
    };

    let reconciler = Reconciler::for_source(&config, &source_key, args.clear_override(), now)?;
    let report = reconciler.run(&mut grid, &batch)?;

    if args.dry_run {
        info!("dry run: grid not persisted");
    } else {
        grid.save(grid_path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {} updated, {} appended, {} frozen, {} missing-id \
             ({} cells written, {} formula cells){}",
            report.source,
            report.updated_rows,
            report.appended_rows,
            report.skipped_frozen,
            report.skipped_missing_id,
            report.cells_written,
            report.formula_cells,
            if args.dry_run { " [dry run]" } else { "" },
        );
    }
    Ok(())
}
