//! Daemon command implementation.

use crate::config::{ApiKeys, AppConfig};
use crate::error::Result;
use crate::output::Formatter;
use lethe_janitor::{Janitor, JanitorWorker};

/// Run passes on the configured interval until Ctrl+C.
pub fn execute_daemon(config: &AppConfig, keys: &ApiKeys, formatter: &Formatter) -> Result<()> {
    let janitor = Janitor::new(config.janitor.clone())?;
    let backends = super::connect(config, keys)?;
    let mut worker = JanitorWorker::new(janitor, backends);

    // Declared after the worker so it is dropped first; the blocking clients
    // must not be dropped inside the runtime.
    let runtime = tokio::runtime::Runtime::new()?;

    println!(
        "{}",
        formatter.info(&format!(
            "Running every {} hours, Ctrl+C to stop",
            config.janitor.check_interval_hours
        ))
    );
    runtime.block_on(worker.run())?;

    if let Some(metrics) = worker.metrics() {
        println!("{}", formatter.success(&format!("Stopped after {} passes", metrics.pass_count)));
    }

    Ok(())
}
