//! Core Janitor implementation: one reconcile + sweep pass

use crate::report::{ItemReport, PassReport, ScopeFailure, StagedEntry};
use crate::{reconciler, sweep, JanitorConfig, JanitorError, JanitorMetrics};
use chrono::{DateTime, NaiveDate, Utc};
use lethe_domain::traits::{CatalogStore, LibraryIndex, RequestBroker};
use lethe_domain::MarkerCodec;
use std::time::Instant;

/// The four backends a pass talks to
///
/// Constructed by the caller and handed to every pass; the Janitor holds no
/// connection of its own.
#[derive(Debug)]
pub struct Backends<L, S, M, R> {
    /// Library index holding items, staging collection and markers
    pub library: L,

    /// Catalog store owning series
    pub series: S,

    /// Catalog store owning movies
    pub movies: M,

    /// Request broker
    pub requests: R,
}

/// Settings shared by every step of one pass
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// Staging collection name
    pub collection: &'a str,

    /// Marker codec
    pub codec: &'a MarkerCodec,

    /// Instant the pass started
    pub now: DateTime<Utc>,

    /// Calendar day the pass runs on (UTC)
    pub today: NaiveDate,

    /// Grace period for newly staged items
    pub deletion_delay_days: u32,

    /// Suppress every mutation
    pub dry_run: bool,
}

/// Janitor service: reconciles staging state and sweeps expired items
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use lethe_clients::memory::{MemoryBroker, MemoryCatalog, MemoryLibrary};
/// use lethe_janitor::{Backends, Janitor, JanitorConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut janitor = Janitor::new(JanitorConfig::default())?;
/// let mut backends = Backends {
///     library: MemoryLibrary::new(),
///     series: MemoryCatalog::new(),
///     movies: MemoryCatalog::new(),
///     requests: MemoryBroker::new(),
/// };
///
/// let report = janitor.run_pass(&mut backends, Utc::now());
/// assert!(report.is_clean());
/// println!("{}", janitor.metrics().summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Janitor {
    config: JanitorConfig,
    codec: MarkerCodec,
    metrics: JanitorMetrics,
}

impl Janitor {
    /// Create a new Janitor with the given configuration
    ///
    /// Zero or empty settings are replaced by their defaults first.
    ///
    /// # Errors
    /// Returns [`JanitorError::Config`] when the configuration is invalid.
    pub fn new(config: JanitorConfig) -> Result<Self, JanitorError> {
        let config = config.with_defaults();
        config.validate()?;
        let codec = config.codec()?;

        Ok(Self {
            config,
            codec,
            metrics: JanitorMetrics::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Marker codec for the configured prefix
    pub fn codec(&self) -> &MarkerCodec {
        &self.codec
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn context(&self, now: DateTime<Utc>) -> PassContext<'_> {
        PassContext {
            collection: &self.config.staging_collection,
            codec: &self.codec,
            now,
            today: now.date_naive(),
            deletion_delay_days: self.config.deletion_delay_days,
            dry_run: self.config.dry_run,
        }
    }

    /// Reconcile every configured library, in order
    ///
    /// A library that cannot be listed is skipped and reported; the others
    /// still run.
    pub fn reconcile<L: LibraryIndex>(
        &self,
        index: &mut L,
        now: DateTime<Utc>,
    ) -> (Vec<ItemReport>, Vec<ScopeFailure>) {
        let ctx = self.context(now);
        let mut reports = Vec::new();
        let mut failures = Vec::new();

        for policy in &self.config.libraries {
            match reconciler::reconcile_library(index, policy, &ctx) {
                Ok(library_reports) => reports.extend(library_reports),
                Err(failure) => failures.push(failure),
            }
        }

        (reports, failures)
    }

    /// Sweep the staging collection for expired items
    pub fn sweep<L, S, M, R>(
        &self,
        backends: &mut Backends<L, S, M, R>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ItemReport>, ScopeFailure>
    where
        L: LibraryIndex,
        S: CatalogStore,
        M: CatalogStore,
        R: RequestBroker,
    {
        sweep::sweep(backends, &self.context(now))
    }

    /// List the staging collection with each item's expiry
    ///
    /// Read-only. Items whose markers cannot be read are listed with the
    /// read error instead of an expiry.
    pub fn staged<L: LibraryIndex>(&self, index: &L) -> Result<Vec<StagedEntry>, ScopeFailure> {
        let collection = &self.config.staging_collection;
        let items = index.staged_items(collection).map_err(|e| ScopeFailure {
            scope: collection.clone(),
            message: e.to_string(),
        })?;

        Ok(items
            .into_iter()
            .map(|item| {
                let markers = match index.markers(&item.id, self.codec.prefix()) {
                    Ok(markers) => markers,
                    Err(e) => {
                        tracing::warn!("Could not read markers of '{}': {}", item.name, e);
                        return StagedEntry {
                            item,
                            expires_on: None,
                            markers: 0,
                            read_error: Some(e.to_string()),
                        };
                    }
                };
                let expires_on = markers
                    .iter()
                    .filter_map(|raw| self.codec.decode(raw).ok())
                    .map(|marker| marker.expires_on())
                    .min();
                StagedEntry {
                    item,
                    expires_on,
                    markers: markers.len(),
                    read_error: None,
                }
            })
            .collect())
    }

    /// Perform a complete pass: reconcile all libraries, then sweep
    ///
    /// This is the main entry point. Per-item and per-library failures are
    /// recorded on the returned report and never abort the pass.
    pub fn run_pass<L, S, M, R>(
        &mut self,
        backends: &mut Backends<L, S, M, R>,
        now: DateTime<Utc>,
    ) -> PassReport
    where
        L: LibraryIndex,
        S: CatalogStore,
        M: CatalogStore,
        R: RequestBroker,
    {
        let start = Instant::now();
        let mut report = PassReport::new(now, self.config.dry_run);

        if self.config.dry_run {
            tracing::info!("DRY RUN: no changes will be made");
        }

        let (reconciled, failures) = self.reconcile(&mut backends.library, now);
        report.reconciled = reconciled;
        report.scope_failures = failures;

        match self.sweep(backends, now) {
            Ok(swept) => report.swept = swept,
            Err(failure) => report.scope_failures.push(failure),
        }

        report.runtime_secs = start.elapsed().as_secs_f64();
        self.metrics.record_pass(&report);

        tracing::info!(
            "Pass finished in {:.1}s: {} reconciled, {} swept, {} with failures",
            report.runtime_secs,
            report.reconciled.len(),
            report.swept.len(),
            report.failed_items()
        );

        report
    }
}
