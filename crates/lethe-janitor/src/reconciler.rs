//! Reconciler
//!
//! Brings each library's staging state in line with current eligibility.
//! Nothing is remembered between runs: membership and markers are re-read
//! from the library index for every item, so a run that failed half way is
//! repaired by the next one.

use crate::config::LibraryPolicy;
use crate::eligibility::{evaluate, EligibilityReason};
use crate::report::{ItemReport, Outcome, ScopeFailure, Step, StepFailure};
use crate::PassContext;
use lethe_domain::traits::LibraryIndex;
use lethe_domain::{ExpirationMarker, MediaItem};

/// Reconcile every item of one library
///
/// # Errors
/// Returns a [`ScopeFailure`] when the library cannot be listed; nothing in
/// it is touched then.
pub fn reconcile_library<L: LibraryIndex>(
    index: &mut L,
    policy: &LibraryPolicy,
    ctx: &PassContext<'_>,
) -> Result<Vec<ItemReport>, ScopeFailure> {
    let items = index.list_items(&policy.name).map_err(|e| {
        tracing::error!("Could not list library '{}': {}", policy.name, e);
        ScopeFailure {
            scope: policy.name.clone(),
            message: e.to_string(),
        }
    })?;

    tracing::info!("Reconciling {} items in '{}'", items.len(), policy.name);

    let rule = policy.rule();
    let mut reports = Vec::with_capacity(items.len());

    for item in items {
        if item.is_excluded_by(&policy.exclusions) {
            tracing::debug!("'{}' is excluded, leaving it alone", item.name);
            reports.push(ItemReport::new(item, Outcome::Excluded));
            continue;
        }

        let evaluation = {
            let index = &*index;
            evaluate(
                &item,
                &rule,
                ctx.now,
                |id| index.is_watched_by_all(id),
                |id| index.added_date(id),
            )
        };
        let mut failures = evaluation.failures;

        let staged = match index.is_in_staging(&item.id, ctx.collection) {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!("Could not check staging of '{}': {}", item.name, e);
                failures.push(StepFailure::new(Step::MembershipLookup, e));
                reports.push(ItemReport::with_failures(item, Outcome::Skipped, failures));
                continue;
            }
        };

        let markers = match index.markers(&item.id, ctx.codec.prefix()) {
            Ok(markers) => markers,
            Err(e) => {
                tracing::warn!("Could not read markers of '{}': {}", item.name, e);
                failures.push(StepFailure::new(Step::ReadMarkers, e));
                reports.push(ItemReport::with_failures(item, Outcome::Skipped, failures));
                continue;
            }
        };

        let outcome = match (staged, evaluation.reason) {
            (false, Some(reason)) => stage(index, &item, reason, &markers, ctx, &mut failures),
            (true, Some(_)) => match markers.len() {
                1 => {
                    tracing::debug!("'{}' is already staged", item.name);
                    Outcome::Unchanged
                }
                0 => restore_marker(index, &item, ctx, &mut failures),
                _ => trim_markers(index, &item, &markers, ctx, &mut failures),
            },
            (true, None) => unstage(index, &item, &markers, ctx, &mut failures),
            (false, None) if !markers.is_empty() => {
                tracing::info!(
                    "'{}' is not staged but carries {} marker(s), clearing",
                    item.name,
                    markers.len()
                );
                clear_markers(index, &item, &markers, ctx, &mut failures);
                Outcome::Repaired
            }
            (false, None) => Outcome::Unchanged,
        };

        reports.push(ItemReport::with_failures(item, outcome, failures));
    }

    Ok(reports)
}

/// Marker for an item staged today
fn new_marker(ctx: &PassContext<'_>) -> Result<ExpirationMarker, StepFailure> {
    ExpirationMarker::after(ctx.today, ctx.deletion_delay_days)
        .map_err(|e| StepFailure::new(Step::WriteMarker, e))
}

/// Add an item to staging and give it a fresh marker
fn stage<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    reason: EligibilityReason,
    leftovers: &[String],
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> Outcome {
    let marker = match new_marker(ctx) {
        Ok(marker) => marker,
        Err(failure) => {
            tracing::warn!("Could not stage '{}': {}", item.name, failure);
            failures.push(failure);
            return Outcome::Failed;
        }
    };
    let encoded = ctx.codec.encode(&marker);

    if ctx.dry_run {
        tracing::info!(
            "DRY RUN: would stage '{}' ({}), expiring {}",
            item.name,
            reason,
            marker.expires_on()
        );
        return Outcome::Staged {
            expires_on: marker.expires_on(),
        };
    }

    if let Err(e) = index.add_to_staging(&item.id, ctx.collection) {
        tracing::warn!("Could not stage '{}': {}", item.name, e);
        failures.push(StepFailure::new(Step::AddToStaging, e));
        return Outcome::Failed;
    }

    let before = failures.len();
    clear_markers(index, item, leftovers, ctx, failures);
    if failures.len() > before {
        // a second marker would break the one-marker invariant; next run repairs
        tracing::warn!(
            "Leftover markers on '{}' could not be cleared, marker not written",
            item.name
        );
        return Outcome::Staged {
            expires_on: marker.expires_on(),
        };
    }

    if let Err(e) = index.add_marker(&item.id, &encoded) {
        tracing::warn!("Could not write marker on '{}': {}", item.name, e);
        failures.push(StepFailure::new(Step::WriteMarker, e));
    }

    tracing::info!(
        "Staged '{}' ({}), expiring {}",
        item.name,
        reason,
        marker.expires_on()
    );
    Outcome::Staged {
        expires_on: marker.expires_on(),
    }
}

/// Take an item out of staging and clear every marker on it
fn unstage<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    markers: &[String],
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> Outcome {
    if ctx.dry_run {
        tracing::info!(
            "DRY RUN: would unstage '{}' and clear {} marker(s)",
            item.name,
            markers.len()
        );
    } else if let Err(e) = index.remove_from_staging(&item.id, ctx.collection) {
        tracing::warn!("Could not unstage '{}': {}", item.name, e);
        failures.push(StepFailure::new(Step::RemoveFromStaging, e));
    } else {
        tracing::info!("Unstaged '{}', no longer eligible", item.name);
    }

    let markers_cleared = clear_markers(index, item, markers, ctx, failures);
    Outcome::Unstaged { markers_cleared }
}

/// Write a marker on a staged item that has none
fn restore_marker<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> Outcome {
    let marker = match new_marker(ctx) {
        Ok(marker) => marker,
        Err(failure) => {
            tracing::warn!("Could not restore marker on '{}': {}", item.name, failure);
            failures.push(failure);
            return Outcome::Failed;
        }
    };

    if ctx.dry_run {
        tracing::info!(
            "DRY RUN: would restore missing marker on '{}' ({})",
            item.name,
            marker.expires_on()
        );
        return Outcome::Repaired;
    }

    match index.add_marker(&item.id, &ctx.codec.encode(&marker)) {
        Ok(()) => tracing::info!(
            "Restored missing marker on '{}', expiring {}",
            item.name,
            marker.expires_on()
        ),
        Err(e) => {
            tracing::warn!("Could not write marker on '{}': {}", item.name, e);
            failures.push(StepFailure::new(Step::WriteMarker, e));
        }
    }
    Outcome::Repaired
}

/// Reduce several markers on a staged item to one
///
/// The earliest decodable marker is kept so that duplicates never postpone
/// a deletion. If none decodes, the first one is kept; the sweep reports it.
fn trim_markers<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    markers: &[String],
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> Outcome {
    let keep = markers
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| ctx.codec.decode(raw).ok().map(|m| (i, m.expires_on())))
        .min_by_key(|(_, expires_on)| *expires_on)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let kept = &markers[keep];
    let extra: Vec<String> = markers.iter().filter(|raw| *raw != kept).cloned().collect();
    let copies = markers.len() - extra.len();

    tracing::info!(
        "'{}' carries {} markers, keeping '{}'",
        item.name,
        markers.len(),
        kept
    );
    clear_markers(index, item, &extra, ctx, failures);
    if copies > 1 {
        collapse_copies(index, item, kept, ctx, failures);
    }
    Outcome::Repaired
}

/// Reduce identical copies of one tag to a single one
///
/// Removing a tag drops every copy of it, so the tag is removed and then
/// written back once.
fn collapse_copies<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    tag: &str,
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) {
    if ctx.dry_run {
        tracing::info!("DRY RUN: would collapse copies of '{}' on '{}'", tag, item.name);
        return;
    }

    if let Err(e) = index.remove_marker(&item.id, tag) {
        tracing::warn!("Could not clear marker '{}' on '{}': {}", tag, item.name, e);
        failures.push(StepFailure::new(Step::ClearMarker, e));
        return;
    }
    if let Err(e) = index.add_marker(&item.id, tag) {
        // left without a marker; the next run restores one
        tracing::warn!("Could not write marker on '{}': {}", item.name, e);
        failures.push(StepFailure::new(Step::WriteMarker, e));
    }
}

/// Remove the given markers, returning how many were removed
pub(crate) fn clear_markers<L: LibraryIndex>(
    index: &mut L,
    item: &MediaItem,
    markers: &[String],
    ctx: &PassContext<'_>,
    failures: &mut Vec<StepFailure>,
) -> usize {
    let mut cleared = 0;
    for raw in markers {
        if ctx.dry_run {
            tracing::info!("DRY RUN: would clear marker '{}' on '{}'", raw, item.name);
            cleared += 1;
            continue;
        }
        match index.remove_marker(&item.id, raw) {
            Ok(()) => cleared += 1,
            Err(e) => {
                tracing::warn!("Could not clear marker '{}' on '{}': {}", raw, item.name, e);
                failures.push(StepFailure::new(Step::ClearMarker, e));
            }
        }
    }
    cleared
}
