//! `tm version`: version information.

use crate::error::Result;
use serde_json::json;

pub fn execute(json: bool) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "name": "trackmerge",
                "version": version,
            }))?
        );
    } else {
        println!("tm {version}");
    }
    Ok(())
}
