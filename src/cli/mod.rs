//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Defect-export reconciliation engine for master tracking grids
#[derive(Parser, Debug)]
#[command(name = "tm", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ./trackmerge.json)
    #[arg(long, global = true, env = "TRACKMERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile one incoming batch into the master grid
    Run(RunArgs),

    /// Validate and show the resolved configuration
    Config(ConfigArgs),

    /// Show version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Incoming batch file (comma-delimited, header row first)
    pub batch: PathBuf,

    /// Source key (detected from the filename pattern if omitted)
    #[arg(long)]
    pub source: Option<String>,

    /// Master grid file (overrides paths.grid_file from the config)
    #[arg(long)]
    pub grid: Option<PathBuf>,

    /// Force the highlight-reset pass before reconciling
    #[arg(long, conflicts_with = "keep_highlights")]
    pub clear_highlights: bool,

    /// Skip the highlight-reset pass, keeping prior-run markers
    #[arg(long)]
    pub keep_highlights: bool,

    /// Reference timestamp for age computation (RFC3339; defaults to now)
    #[arg(long)]
    pub now: Option<String>,

    /// Reconcile but do not persist the grid
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Tri-state highlight-reset override from the two flags.
    #[must_use]
    pub const fn clear_override(&self) -> Option<bool> {
        if self.clear_highlights {
            Some(true)
        } else if self.keep_highlights {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Only validate; print nothing on success
    #[arg(long)]
    pub check: bool,
}
