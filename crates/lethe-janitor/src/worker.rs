//! Background worker for continuous Janitor operation

use crate::report::PassReport;
use crate::{Backends, Janitor, JanitorError, JanitorMetrics};
use chrono::Utc;
use lethe_domain::traits::{CatalogStore, LibraryIndex, RequestBroker};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Janitor and backends travel together to the blocking pool and back
struct State<L, S, M, R> {
    janitor: Janitor,
    backends: Backends<L, S, M, R>,
}

/// Background worker that runs Janitor passes on a schedule
///
/// Passes are synchronous and talk to blocking gateways, so each one runs on
/// tokio's blocking thread pool. The worker awaits it before the next tick;
/// passes never overlap.
///
/// # Examples
///
/// ```no_run
/// use lethe_clients::memory::{MemoryBroker, MemoryCatalog, MemoryLibrary};
/// use lethe_janitor::{Backends, Janitor, JanitorConfig, JanitorWorker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let janitor = Janitor::new(JanitorConfig::default())?;
///     let backends = Backends {
///         library: MemoryLibrary::new(),
///         series: MemoryCatalog::new(),
///         movies: MemoryCatalog::new(),
///         requests: MemoryBroker::new(),
///     };
///     let mut worker = JanitorWorker::new(janitor, backends);
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker<L, S, M, R> {
    state: Option<State<L, S, M, R>>,
    interval: Duration,
}

impl<L, S, M, R> JanitorWorker<L, S, M, R>
where
    L: LibraryIndex + Send + 'static,
    S: CatalogStore + Send + 'static,
    M: CatalogStore + Send + 'static,
    R: RequestBroker + Send + 'static,
{
    /// Create a worker running passes at the janitor's configured interval
    pub fn new(janitor: Janitor, backends: Backends<L, S, M, R>) -> Self {
        let interval = janitor.config().check_interval();
        Self {
            state: Some(State { janitor, backends }),
            interval,
        }
    }

    /// Override the pass interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// The first pass starts immediately. The signal is honoured between
    /// passes, never in the middle of one.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass panicked on the blocking pool.
    pub async fn run(&mut self) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.pass().await?;
                    if !report.is_clean() {
                        tracing::warn!(
                            "Pass had {} item failure(s) and {} skipped scope(s), retrying next cycle",
                            report.failed_items(),
                            report.scope_failures.len()
                        );
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
            }
        }

        if let Some(metrics) = self.metrics() {
            tracing::info!("Janitor stopped. Final metrics:\n{}", metrics.summary());
        }

        Ok(())
    }

    /// Run for a specific number of passes (useful for testing)
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<Vec<PassReport>, JanitorError> {
        let mut ticker = interval(self.interval);
        let mut reports = Vec::with_capacity(cycles);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting pass {}/{}", cycle + 1, cycles);
            reports.push(self.pass().await?);
        }

        if let Some(metrics) = self.metrics() {
            tracing::info!(
                "Janitor finished {} cycles. Final metrics:\n{}",
                cycles,
                metrics.summary()
            );
        }

        Ok(reports)
    }

    async fn pass(&mut self) -> Result<PassReport, JanitorError> {
        let mut state = self
            .state
            .take()
            .ok_or_else(|| JanitorError::Worker("backends lost in an earlier pass".to_string()))?;

        let (state, report) = tokio::task::spawn_blocking(move || {
            let report = state.janitor.run_pass(&mut state.backends, Utc::now());
            (state, report)
        })
        .await
        .map_err(|e| JanitorError::Worker(format!("pass aborted: {}", e)))?;

        self.state = Some(state);
        Ok(report)
    }

    /// Get a reference to the janitor's current metrics
    ///
    /// `None` only after a pass panicked and took the janitor with it.
    pub fn metrics(&self) -> Option<&JanitorMetrics> {
        self.state.as_ref().map(|state| state.janitor.metrics())
    }

    /// Reset the janitor's metrics counters
    pub fn reset_metrics(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.janitor.reset_metrics();
        }
    }

    /// Take back the janitor and backends
    pub fn into_parts(self) -> Option<(Janitor, Backends<L, S, M, R>)> {
        self.state.map(|state| (state.janitor, state.backends))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibraryPolicy;
    use crate::report::Outcome;
    use crate::JanitorConfig;
    use lethe_clients::memory::{MemoryBroker, MemoryCatalog, MemoryLibrary};
    use lethe_domain::{ItemId, MediaItem, MediaKind};

    type TestWorker = JanitorWorker<MemoryLibrary, MemoryCatalog, MemoryCatalog, MemoryBroker>;

    fn worker() -> TestWorker {
        let config = JanitorConfig {
            libraries: vec![LibraryPolicy {
                name: "Shows".to_string(),
                delete_if_watched_by_all: true,
                max_age_days: 0,
                exclusions: Vec::new(),
            }],
            ..Default::default()
        };
        let mut backends = Backends {
            library: MemoryLibrary::new(),
            series: MemoryCatalog::new(),
            movies: MemoryCatalog::new(),
            requests: MemoryBroker::new(),
        };
        backends.library.add_item(
            "Shows",
            MediaItem::new("s1", "Dark", MediaKind::Series, "334824"),
            Utc::now(),
        );
        backends.library.set_watched_by_all(&ItemId::new("s1"), true);

        JanitorWorker::new(Janitor::new(config).unwrap(), backends)
            .with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = worker();
        assert_eq!(worker.metrics().unwrap().pass_count, 0);
    }

    #[tokio::test]
    async fn test_interval_from_config() {
        let janitor = Janitor::new(JanitorConfig {
            check_interval_hours: 2,
            ..Default::default()
        })
        .unwrap();
        let worker = JanitorWorker::new(
            janitor,
            Backends {
                library: MemoryLibrary::new(),
                series: MemoryCatalog::new(),
                movies: MemoryCatalog::new(),
                requests: MemoryBroker::new(),
            },
        );
        assert_eq!(worker.interval, Duration::from_secs(7200));
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let mut worker = worker();

        let reports = worker.run_cycles(2).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(worker.metrics().unwrap().pass_count, 2);
        assert!(matches!(
            reports[0].reconciled[0].outcome,
            Outcome::Staged { .. }
        ));
        assert_eq!(reports[1].reconciled[0].outcome, Outcome::Unchanged);
    }

    #[tokio::test]
    async fn test_backends_returned_after_passes() {
        let mut worker = worker();
        worker.run_cycles(1).await.unwrap();

        let (janitor, backends) = worker.into_parts().unwrap();
        assert_eq!(janitor.metrics().staged, 1);
        assert!(backends
            .library
            .is_staged(&ItemId::new("s1"), "Headed Out"));
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let mut worker = worker();

        worker.run_cycles(1).await.unwrap();
        assert_eq!(worker.metrics().unwrap().pass_count, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().unwrap().pass_count, 0);
    }
}
