//! Logging initialization for `trackmerge`.
//!
//! Verbosity mapping:
//! - quiet: errors only
//! - default: warnings
//! - `-v`: info
//! - `-vv`: debug
//! - `-vvv`: trace
//!
//! `TRACKMERGE_LOG` overrides the verbosity-derived filter entirely.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TEST_INIT: Once = Once::new();

/// Build the env filter for the requested verbosity.
fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("TRACKMERGE_LOG") {
        return filter;
    }

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Initialize global logging for the binary.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set subscriber: {e}"))?;
    Ok(())
}

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter_for(2, false))
            .with_writer(std::io::stderr)
            .with_test_writer()
            .try_init();
    });
}
