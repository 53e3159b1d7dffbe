//! Sweep executor
//!
//! Walks the staging collection and deletes every item whose marker has come
//! due. Deletion spans several systems with no transaction across them, so
//! the steps run in a fixed order:
//!
//! - **A** delete from the item's catalog store (must succeed, or the item
//!   stays staged and is retried next sweep)
//! - **B** remove from the staging collection
//! - **C** clear every marker on the item
//! - **D** remove matching requests from the request broker (best effort)

use crate::reconciler::clear_markers;
use crate::report::{ItemReport, Outcome, ScopeFailure, Step, StepFailure};
use crate::{Backends, PassContext};
use chrono::NaiveDate;
use lethe_domain::traits::{
    CatalogStore, DeleteOptions, LibraryIndex, RequestBroker, RequestRemoval,
};
use lethe_domain::{ExpirationMarker, MediaItem, MediaKind};

/// Sweep the staging collection
///
/// # Errors
/// Returns a [`ScopeFailure`] when the collection cannot be listed; no item
/// is touched then.
pub fn sweep<L, S, M, R>(
    backends: &mut Backends<L, S, M, R>,
    ctx: &PassContext<'_>,
) -> Result<Vec<ItemReport>, ScopeFailure>
where
    L: LibraryIndex,
    S: CatalogStore,
    M: CatalogStore,
    R: RequestBroker,
{
    let staged = backends
        .library
        .staged_items(ctx.collection)
        .map_err(|e| {
            tracing::error!("Could not list staging collection '{}': {}", ctx.collection, e);
            ScopeFailure {
                scope: ctx.collection.to_string(),
                message: e.to_string(),
            }
        })?;

    tracing::info!("Sweeping {} staged items", staged.len());

    Ok(staged
        .into_iter()
        .map(|item| sweep_item(backends, item, ctx))
        .collect())
}

fn sweep_item<L, S, M, R>(
    backends: &mut Backends<L, S, M, R>,
    item: MediaItem,
    ctx: &PassContext<'_>,
) -> ItemReport
where
    L: LibraryIndex,
    S: CatalogStore,
    M: CatalogStore,
    R: RequestBroker,
{
    let mut failures = Vec::new();

    let markers = match backends.library.markers(&item.id, ctx.codec.prefix()) {
        Ok(markers) => markers,
        Err(e) => {
            tracing::warn!("Could not read markers of '{}': {}", item.name, e);
            failures.push(StepFailure::new(Step::ReadMarkers, e));
            return ItemReport::with_failures(item, Outcome::Failed, failures);
        }
    };

    if markers.is_empty() {
        tracing::warn!("'{}' is staged without an expiration marker", item.name);
        return ItemReport::new(item, Outcome::Orphaned);
    }

    let mut earliest: Option<NaiveDate> = None;
    for raw in &markers {
        let marker = match ctx.codec.decode(raw) {
            Ok(marker) => marker,
            Err(e) => {
                tracing::warn!("Skipping marker on '{}': {}", item.name, e);
                failures.push(StepFailure::new(Step::DecodeMarker, e));
                continue;
            }
        };

        if marker.is_due(ctx.today) {
            // the sequence runs once per item, remaining markers are cleared by it
            let outcome = delete_item(backends, &item, marker, &markers, ctx, &mut failures);
            return ItemReport::with_failures(item, outcome, failures);
        }

        let expires_on = marker.expires_on();
        earliest = Some(earliest.map_or(expires_on, |e| e.min(expires_on)));
    }

    let outcome = match earliest {
        Some(expires_on) => {
            tracing::debug!("'{}' expires {}", item.name, expires_on);
            Outcome::Pending { expires_on }
        }
        None => Outcome::Failed,
    };
    ItemReport::with_failures(item, outcome, failures)
}

/// Run steps A to D for one item
fn delete_item<L, S, M, R>(
    backends: &mut Backends<L, S, M, R>,
    item: &MediaItem,
    marker: ExpirationMarker,
    markers: &[String],
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> Outcome
where
    L: LibraryIndex,
    S: CatalogStore,
    M: CatalogStore,
    R: RequestBroker,
{
    tracing::info!(
        "'{}' expired on {}, deleting",
        item.name,
        marker.expires_on()
    );

    // A
    let purged = match item.kind {
        MediaKind::Series => purge(&mut backends.series, item, ctx.dry_run),
        MediaKind::Movie => purge(&mut backends.movies, item, ctx.dry_run),
    };
    if let Err(failure) = purged {
        tracing::error!(
            "Could not delete '{}' from {}: {}",
            item.name,
            store_name(item.kind),
            failure.message
        );
        failures.push(failure);
        return Outcome::Failed;
    }

    // B
    if ctx.dry_run {
        tracing::info!("DRY RUN: would unstage '{}'", item.name);
    } else if let Err(e) = backends
        .library
        .remove_from_staging(&item.id, ctx.collection)
    {
        tracing::warn!("Could not unstage deleted '{}': {}", item.name, e);
        failures.push(StepFailure::new(Step::RemoveFromStaging, e));
    }

    // C
    clear_markers(&mut backends.library, item, markers, ctx, failures);

    // D
    if ctx.dry_run {
        tracing::info!("DRY RUN: would remove requests for '{}'", item.name);
    } else {
        match backends.requests.delete_request(&item.external_id, item.kind) {
            Ok(RequestRemoval::Removed(count)) => {
                tracing::info!("Removed {} request(s) for '{}'", count, item.name)
            }
            Ok(RequestRemoval::NotFound) => {
                tracing::debug!("No requests found for '{}'", item.name)
            }
            Err(e) => {
                tracing::warn!("Could not remove requests for '{}': {}", item.name, e);
                failures.push(StepFailure::new(Step::RequestCleanup, e));
            }
        }
    }

    tracing::info!("Deleted '{}'", item.name);
    Outcome::Deleted {
        expires_on: marker.expires_on(),
    }
}

/// Step A against one catalog store
fn purge<C: CatalogStore>(
    store: &mut C,
    item: &MediaItem,
    dry_run: bool,
) -> Result<(), StepFailure> {
    if item.external_id.is_empty() {
        return Err(StepFailure::new(
            Step::CatalogLookup,
            format!("item has no {} id", item.kind.provider()),
        ));
    }

    let record = store
        .lookup_by_external_id(&item.external_id)
        .map_err(|e| StepFailure::new(Step::CatalogLookup, e))?
        .ok_or_else(|| {
            StepFailure::new(
                Step::CatalogLookup,
                format!(
                    "no record for {} id {}",
                    item.kind.provider(),
                    item.external_id
                ),
            )
        })?;

    if dry_run {
        tracing::info!(
            "DRY RUN: would delete '{}' (record {}) and its files",
            record.title,
            record.id
        );
        return Ok(());
    }

    store
        .delete(record.id, DeleteOptions::purge())
        .map_err(|e| StepFailure::new(Step::CatalogDelete, e))
}

fn store_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Series => "series store",
        MediaKind::Movie => "movie store",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use lethe_clients::memory::{LibraryOp, MemoryBroker, MemoryCatalog, MemoryLibrary};
    use lethe_domain::{ItemId, MarkerCodec};

    const COLLECTION: &str = "Headed Out";

    type TestBackends = Backends<MemoryLibrary, MemoryCatalog, MemoryCatalog, MemoryBroker>;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-10T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ctx(codec: &MarkerCodec, dry_run: bool) -> PassContext<'_> {
        PassContext {
            collection: COLLECTION,
            codec,
            now: now(),
            today: now().date_naive(),
            deletion_delay_days: 7,
            dry_run,
        }
    }

    fn marker(month: u32, day: u32) -> String {
        let date = NaiveDate::from_ymd_opt(2025, month, day).unwrap();
        MarkerCodec::default().encode(&ExpirationMarker::new(date))
    }

    fn backends_with(kind: MediaKind, markers: &[String]) -> (TestBackends, ItemId) {
        let mut backends = Backends {
            library: MemoryLibrary::new(),
            series: MemoryCatalog::new(),
            movies: MemoryCatalog::new(),
            requests: MemoryBroker::new(),
        };
        let item = MediaItem::new("i1", "Heat", kind, "949");
        let id = item.id.clone();
        backends.library.add_item("Movies", item, now());
        backends.library.seed_staged(&id, COLLECTION);
        for raw in markers {
            backends.library.seed_tag(&id, raw);
        }
        match kind {
            MediaKind::Series => backends.series.add_record("949", "Heat"),
            MediaKind::Movie => backends.movies.add_record("949", "Heat"),
        };
        backends.requests.add_request("949", kind);
        (backends, id)
    }

    #[test]
    fn test_due_item_is_deleted_everywhere() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 10)]);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert!(matches!(reports[0].outcome, Outcome::Deleted { .. }));
        assert!(reports[0].is_clean());
        assert!(!backends.movies.contains("949"));
        assert_eq!(backends.movies.deletions()[0].1, DeleteOptions::purge());
        assert!(!backends.library.is_staged(&id, COLLECTION));
        assert!(backends.library.tags(&id).is_empty());
        assert_eq!(backends.requests.pending(), 0);
    }

    #[test]
    fn test_series_go_to_series_store() {
        let codec = MarkerCodec::default();
        let (mut backends, _) = backends_with(MediaKind::Series, &[marker(3, 1)]);

        sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert!(!backends.series.contains("949"));
        assert!(backends.movies.deletions().is_empty());
    }

    #[test]
    fn test_future_marker_is_pending() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 11)]);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        let expected = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert_eq!(reports[0].outcome, Outcome::Pending { expires_on: expected });
        assert!(backends.movies.contains("949"));
        assert!(backends.library.is_staged(&id, COLLECTION));
    }

    #[test]
    fn test_catalog_failure_keeps_item_staged() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 1)]);
        backends.movies.set_failing_deletes(true);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert_eq!(reports[0].outcome, Outcome::Failed);
        assert_eq!(reports[0].failures[0].step, Step::CatalogDelete);
        assert!(backends.library.is_staged(&id, COLLECTION));
        assert_eq!(backends.library.tags(&id), vec![marker(3, 1)]);
        assert_eq!(backends.requests.calls(), 0);
    }

    #[test]
    fn test_missing_catalog_record_is_failure() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 1)]);
        backends.movies = MemoryCatalog::new();

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert_eq!(reports[0].outcome, Outcome::Failed);
        assert_eq!(reports[0].failures[0].step, Step::CatalogLookup);
        assert!(backends.library.is_staged(&id, COLLECTION));
    }

    #[test]
    fn test_broker_failure_is_only_a_warning() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 1)]);
        backends.requests.set_failing(true);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert!(matches!(reports[0].outcome, Outcome::Deleted { .. }));
        assert_eq!(reports[0].failures[0].step, Step::RequestCleanup);
        assert!(!backends.library.is_staged(&id, COLLECTION));
    }

    #[test]
    fn test_undecodable_marker_is_skipped() {
        let codec = MarkerCodec::default();
        let (mut backends, id) =
            backends_with(MediaKind::Movie, &["Lethe-Expires-someday".to_string()]);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert_eq!(reports[0].outcome, Outcome::Failed);
        assert_eq!(reports[0].failures[0].step, Step::DecodeMarker);
        assert!(backends.movies.contains("949"));
        assert!(backends.library.is_staged(&id, COLLECTION));
    }

    #[test]
    fn test_one_deletion_for_several_due_markers() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(
            MediaKind::Movie,
            &[marker(3, 1), "Lethe-Expires-bad".to_string(), marker(3, 5)],
        );

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(backends.movies.deletions().len(), 1);
        assert!(backends.library.tags(&id).is_empty());
    }

    #[test]
    fn test_item_without_markers_is_orphaned() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[]);

        let reports = sweep(&mut backends, &ctx(&codec, false)).unwrap();

        assert_eq!(reports[0].outcome, Outcome::Orphaned);
        assert!(backends.library.is_staged(&id, COLLECTION));
        assert!(backends.library.mutations().is_empty());
    }

    #[test]
    fn test_staging_listing_failure_skips_sweep() {
        let codec = MarkerCodec::default();
        let (mut backends, _) = backends_with(MediaKind::Movie, &[marker(3, 1)]);
        backends.library.fail(LibraryOp::StagedItems);

        let failure = sweep(&mut backends, &ctx(&codec, false)).unwrap_err();

        assert_eq!(failure.scope, COLLECTION);
        assert!(backends.movies.contains("949"));
    }

    #[test]
    fn test_dry_run_deletes_nothing() {
        let codec = MarkerCodec::default();
        let (mut backends, id) = backends_with(MediaKind::Movie, &[marker(3, 1)]);

        let reports = sweep(&mut backends, &ctx(&codec, true)).unwrap();

        assert!(matches!(reports[0].outcome, Outcome::Deleted { .. }));
        assert!(backends.movies.contains("949"));
        assert!(backends.library.is_staged(&id, COLLECTION));
        assert_eq!(backends.requests.calls(), 0);
    }
}
