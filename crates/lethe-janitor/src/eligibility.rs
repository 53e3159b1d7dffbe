//! Eligibility evaluation
//!
//! Pure decision logic: given an item, its library's rule and two lookups,
//! decide whether the item qualifies for staging. Checks run in order and the
//! first one satisfied wins. A lookup that fails counts as "not satisfied" so
//! that an unreachable server never gets anything staged.

use crate::report::{Step, StepFailure};
use chrono::{DateTime, Utc};
use lethe_domain::{ItemId, LibraryRule, MediaItem};
use std::fmt;

/// Why an item qualified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityReason {
    /// Every known user has played the item
    WatchedByAll,

    /// Item is older than the library's maximum age
    MaxAgeExceeded,
}

impl fmt::Display for EligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityReason::WatchedByAll => write!(f, "watched by all users"),
            EligibilityReason::MaxAgeExceeded => write!(f, "exceeds maximum age"),
        }
    }
}

/// Result of evaluating one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Reason the item qualified; `None` when it did not
    pub reason: Option<EligibilityReason>,

    /// Lookups that failed while evaluating
    pub failures: Vec<StepFailure>,
}

impl Evaluation {
    /// Whether the item qualified
    pub fn is_eligible(&self) -> bool {
        self.reason.is_some()
    }
}

/// Evaluate an item against a rule
///
/// `watched_by_all` and `added_date` are only called when the rule needs them.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use lethe_domain::{LibraryRule, MediaItem, MediaKind};
/// use lethe_janitor::eligibility::{evaluate, EligibilityReason};
///
/// let now = Utc::now();
/// let item = MediaItem::new("m1", "Heat", MediaKind::Movie, "949");
/// let rule = LibraryRule { delete_if_watched_by_all: false, max_age_days: 30 };
///
/// let evaluation = evaluate(
///     &item,
///     &rule,
///     now,
///     |_| Ok::<_, String>(false),
///     |_| Ok(now - Duration::days(31)),
/// );
/// assert_eq!(evaluation.reason, Some(EligibilityReason::MaxAgeExceeded));
/// ```
pub fn evaluate<W, A, E>(
    item: &MediaItem,
    rule: &LibraryRule,
    now: DateTime<Utc>,
    watched_by_all: W,
    added_date: A,
) -> Evaluation
where
    W: FnOnce(&ItemId) -> Result<bool, E>,
    A: FnOnce(&ItemId) -> Result<DateTime<Utc>, E>,
    E: fmt::Display,
{
    let mut evaluation = Evaluation::default();

    if rule.delete_if_watched_by_all {
        match watched_by_all(&item.id) {
            Ok(true) => {
                evaluation.reason = Some(EligibilityReason::WatchedByAll);
                return evaluation;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Could not check watch status of '{}': {}", item.name, e);
                evaluation
                    .failures
                    .push(StepFailure::new(Step::WatchLookup, e));
            }
        }
    }

    if rule.max_age_days > 0 {
        match added_date(&item.id) {
            Ok(added) => {
                let age_days = (now - added).num_days();
                if age_days > i64::from(rule.max_age_days) {
                    tracing::debug!(
                        "'{}' is {} days old (limit {})",
                        item.name,
                        age_days,
                        rule.max_age_days
                    );
                    evaluation.reason = Some(EligibilityReason::MaxAgeExceeded);
                }
            }
            Err(e) => {
                tracing::warn!("Could not read added date of '{}': {}", item.name, e);
                evaluation
                    .failures
                    .push(StepFailure::new(Step::AddedDateLookup, e));
            }
        }
    }

    evaluation
}
