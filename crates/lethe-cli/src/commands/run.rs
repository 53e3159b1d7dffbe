//! Run command implementation.

use crate::config::{ApiKeys, AppConfig};
use crate::error::Result;
use crate::output::Formatter;
use chrono::Utc;
use lethe_janitor::Janitor;

/// Execute one reconcile and sweep pass and print its report.
pub fn execute_run(config: &AppConfig, keys: &ApiKeys, formatter: &Formatter) -> Result<()> {
    let mut janitor = Janitor::new(config.janitor.clone())?;
    let mut backends = super::connect(config, keys)?;

    let report = janitor.run_pass(&mut backends, Utc::now());
    tracing::info!("{}", janitor.metrics().summary());

    let output = formatter.format_report(&report)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
