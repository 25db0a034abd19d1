//! `tm config`: validate and show the resolved configuration.

use crate::cli::ConfigArgs;
use crate::config::{MergeConfig, resolve_config_path};
use crate::error::Result;
use std::path::Path;

pub fn execute(args: &ConfigArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let config = MergeConfig::load(&path)?;

    if args.check {
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config: {}", path.display());
    println!("Grid:   {}", config.paths.grid_file.display());
    for (name, source) in &config.sources {
        let date = source.date_col.as_deref().unwrap_or("-");
        let pattern = source.pattern.as_deref().unwrap_or("-");
        println!(
            "Source {name}: {} mapped fields, date_col={date}, pattern={pattern}",
            source.mapping.len()
        );
    }
    println!(
        "Rules: {} function, {} root-cause",
        config.function_rules.len(),
        config.root_cause_rules.len()
    );
    Ok(())
}
