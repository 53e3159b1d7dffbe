//! Check-config command implementation.

use crate::config::{ApiKeys, AppConfig};
use crate::error::Result;
use crate::output::Formatter;

/// Print the validated configuration and report missing API keys.
///
/// Loading already validated the file; this only reports on it.
pub fn execute_check_config(config: &AppConfig, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_config(config)?);

    if let Err(e) = ApiKeys::from_env() {
        eprintln!("{}", formatter.warning(&e.to_string()));
    }

    Ok(())
}
