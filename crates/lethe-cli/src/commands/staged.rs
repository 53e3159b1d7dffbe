//! Staged command implementation.

use crate::config::{ApiKeys, AppConfig};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use lethe_janitor::Janitor;

/// List the staging collection with decoded expiry dates.
pub fn execute_staged(config: &AppConfig, keys: &ApiKeys, formatter: &Formatter) -> Result<()> {
    let janitor = Janitor::new(config.janitor.clone())?;

    let library = super::library(config, keys)?;

    let entries = janitor
        .staged(&library)
        .map_err(|failure| CliError::Backend(format!("{}: {}", failure.scope, failure.message)))?;

    let output = formatter.format_staged(&entries)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
