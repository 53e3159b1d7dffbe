//! What a pass did, item by item

use chrono::{DateTime, NaiveDate, Utc};
use lethe_domain::MediaItem;
use std::fmt;

/// A single gateway interaction that can fail on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Watched-by-all lookup
    WatchLookup,
    /// Added-date lookup
    AddedDateLookup,
    /// Staging membership lookup
    MembershipLookup,
    /// Reading the item's markers
    ReadMarkers,
    /// Adding the item to the staging collection
    AddToStaging,
    /// Writing an expiration marker
    WriteMarker,
    /// Removing the item from the staging collection
    RemoveFromStaging,
    /// Removing an expiration marker
    ClearMarker,
    /// Decoding an expiration marker
    DecodeMarker,
    /// Finding the item in its catalog store
    CatalogLookup,
    /// Deleting the item from its catalog store
    CatalogDelete,
    /// Removing the item's requests from the request broker
    RequestCleanup,
}

impl Step {
    /// Short name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::WatchLookup => "watch-lookup",
            Step::AddedDateLookup => "added-date-lookup",
            Step::MembershipLookup => "membership-lookup",
            Step::ReadMarkers => "read-markers",
            Step::AddToStaging => "add-to-staging",
            Step::WriteMarker => "write-marker",
            Step::RemoveFromStaging => "remove-from-staging",
            Step::ClearMarker => "clear-marker",
            Step::DecodeMarker => "decode-marker",
            Step::CatalogLookup => "catalog-lookup",
            Step::CatalogDelete => "catalog-delete",
            Step::RequestCleanup => "request-cleanup",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed step and the gateway's error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Which step failed
    pub step: Step,

    /// Error message from the gateway
    pub message: String,
}

impl StepFailure {
    /// Record a failed step
    pub fn new(step: Step, message: impl fmt::Display) -> Self {
        Self {
            step,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// What happened to an item
///
/// The outcome names the intended transition; whether every side effect of
/// it landed is told by the report's failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Newly staged with the given expiry
    Staged {
        /// Expiry date written to the marker
        expires_on: NaiveDate,
    },

    /// Taken out of staging
    Unstaged {
        /// Markers removed from the item
        markers_cleared: usize,
    },

    /// Marker drift from an earlier run corrected
    Repaired,

    /// Nothing to do
    Unchanged,

    /// Name on the library's exclusion list, left as is
    Excluded,

    /// Current state could not be read, item left for the next run
    Skipped,

    /// Staged and waiting for its expiry
    Pending {
        /// Earliest expiry found on the item
        expires_on: NaiveDate,
    },

    /// Removed from its catalog store
    Deleted {
        /// Expiry of the marker that triggered the deletion
        expires_on: NaiveDate,
    },

    /// Staged without any marker
    Orphaned,

    /// Intended action did not happen, item stays staged
    Failed,
}

impl Outcome {
    /// Short label for tables
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Staged { .. } => "staged",
            Outcome::Unstaged { .. } => "unstaged",
            Outcome::Repaired => "repaired",
            Outcome::Unchanged => "unchanged",
            Outcome::Excluded => "excluded",
            Outcome::Skipped => "skipped",
            Outcome::Pending { .. } => "pending",
            Outcome::Deleted { .. } => "deleted",
            Outcome::Orphaned => "orphaned",
            Outcome::Failed => "failed",
        }
    }

    /// Expiry date attached to the outcome, if any
    pub fn expires_on(&self) -> Option<NaiveDate> {
        match self {
            Outcome::Staged { expires_on }
            | Outcome::Pending { expires_on }
            | Outcome::Deleted { expires_on } => Some(*expires_on),
            _ => None,
        }
    }
}

/// Report for one item in one phase of a pass
#[derive(Debug, Clone)]
pub struct ItemReport {
    /// The item as seen during the pass
    pub item: MediaItem,

    /// What happened
    pub outcome: Outcome,

    /// Steps that failed along the way
    pub failures: Vec<StepFailure>,
}

impl ItemReport {
    /// Report without failures
    pub fn new(item: MediaItem, outcome: Outcome) -> Self {
        Self {
            item,
            outcome,
            failures: Vec::new(),
        }
    }

    /// Report carrying the failures collected for the item
    pub fn with_failures(item: MediaItem, outcome: Outcome, failures: Vec<StepFailure>) -> Self {
        Self {
            item,
            outcome,
            failures,
        }
    }

    /// Whether every step succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A member of the staging collection and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// The staged item
    pub item: MediaItem,

    /// Earliest decodable expiry, `None` when no marker decodes
    pub expires_on: Option<NaiveDate>,

    /// Number of markers on the item
    pub markers: usize,

    /// Why the markers could not be read, if they could not
    pub read_error: Option<String>,
}

/// A failure that cost a whole library or the whole sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFailure {
    /// Library name, or the staging collection for the sweep
    pub scope: String,

    /// Error message from the gateway
    pub message: String,
}

/// Everything one pass did
#[derive(Debug, Clone)]
pub struct PassReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,

    /// Whether mutations were suppressed
    pub dry_run: bool,

    /// Reconciler results, libraries in configured order
    pub reconciled: Vec<ItemReport>,

    /// Sweep results
    pub swept: Vec<ItemReport>,

    /// Libraries or sweeps that could not run at all
    pub scope_failures: Vec<ScopeFailure>,

    /// Wall-clock duration of the pass in seconds
    pub runtime_secs: f64,
}

impl PassReport {
    /// Empty report for a pass starting at `started_at`
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            dry_run,
            reconciled: Vec::new(),
            swept: Vec::new(),
            scope_failures: Vec::new(),
            runtime_secs: 0.0,
        }
    }

    /// All item reports, reconciler first
    pub fn items(&self) -> impl Iterator<Item = &ItemReport> {
        self.reconciled.iter().chain(self.swept.iter())
    }

    /// Number of item reports matching a predicate on the outcome
    pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.items().filter(|report| predicate(&report.outcome)).count()
    }

    /// Number of items with at least one failed step
    pub fn failed_items(&self) -> usize {
        self.items().filter(|report| !report.is_clean()).count()
    }

    /// Whether nothing failed anywhere in the pass
    pub fn is_clean(&self) -> bool {
        self.scope_failures.is_empty() && self.failed_items() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lethe_domain::MediaKind;

    fn item(name: &str) -> MediaItem {
        MediaItem::new(name, name, MediaKind::Movie, "1")
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_outcome_labels_and_dates() {
        assert_eq!(Outcome::Staged { expires_on: date(8) }.label(), "staged");
        assert_eq!(
            Outcome::Deleted { expires_on: date(8) }.expires_on(),
            Some(date(8))
        );
        assert_eq!(Outcome::Orphaned.expires_on(), None);
    }

    #[test]
    fn test_step_failure_display() {
        let failure = StepFailure::new(Step::CatalogDelete, "503 Service Unavailable");
        assert_eq!(failure.to_string(), "catalog-delete: 503 Service Unavailable");
    }

    #[test]
    fn test_pass_report_counts() {
        let mut report = PassReport::new(Utc::now(), false);
        report
            .reconciled
            .push(ItemReport::new(item("a"), Outcome::Staged { expires_on: date(8) }));
        report.reconciled.push(ItemReport::with_failures(
            item("b"),
            Outcome::Failed,
            vec![StepFailure::new(Step::AddToStaging, "timeout")],
        ));
        report
            .swept
            .push(ItemReport::new(item("c"), Outcome::Deleted { expires_on: date(1) }));

        assert_eq!(report.items().count(), 3);
        assert_eq!(report.count(|o| matches!(o, Outcome::Deleted { .. })), 1);
        assert_eq!(report.failed_items(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_scope_failure_makes_pass_unclean() {
        let mut report = PassReport::new(Utc::now(), true);
        assert!(report.is_clean());
        report.scope_failures.push(ScopeFailure {
            scope: "Movies".to_string(),
            message: "library not found".to_string(),
        });
        assert!(!report.is_clean());
    }
}
