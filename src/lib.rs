//! `trackmerge`, a defect-export reconciliation engine.
//!
//! Reconciles periodic exports from external issue trackers into one
//! persistent master tabular dataset: identity resolution against the
//! grid's ID column, update-in-place vs append decisions, derived-field
//! rule tables, terminal-state protection, change-tracking fill markers,
//! and formula-column recomputation.
//!
//! The spreadsheet container, pivot refresh, and folder-watch triggering
//! are external collaborators behind the [`grid::Grid`] and
//! [`batch::IncomingBatch`] seams.

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod logging;
pub mod model;
pub mod util;

pub use error::{MergeError, Result, StructuredError};
