use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Dependency;

/// Write `deps` as pretty JSON to `out_file`, or to stdout when `None`.
pub fn write(deps: &[Dependency], out_file: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(deps)?;

    match out_file {
        Some(path) => {
            info!(dependencies = deps.len(), file = %path.display(), "writing JSON report");
            std::fs::write(path, json + "\n")
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => println!("{json}"),
    }

    Ok(())
}
