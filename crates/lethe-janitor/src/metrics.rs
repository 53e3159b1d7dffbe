//! Metrics collection for Janitor operations

use crate::report::{Outcome, PassReport};
use lethe_domain::MediaKind;
use std::collections::HashMap;

/// Metrics collected across passes
///
/// Tracks items staged, unstaged and deleted per kind, failures, and pass
/// statistics.
#[derive(Debug, Clone, Default)]
pub struct JanitorMetrics {
    /// Items newly staged
    pub staged: usize,

    /// Items taken out of staging
    pub unstaged: usize,

    /// Items whose marker drift was repaired
    pub repaired: usize,

    /// Items deleted per kind
    pub deleted: HashMap<MediaKind, usize>,

    /// Item reports carrying at least one failed step
    pub failed_items: usize,

    /// Libraries or sweeps that could not run
    pub scope_failures: usize,

    /// Total passes completed
    pub pass_count: usize,

    /// Total runtime in seconds
    pub total_runtime_secs: f64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished pass into the totals
    pub fn record_pass(&mut self, report: &PassReport) {
        for item in report.items() {
            match item.outcome {
                Outcome::Staged { .. } => self.staged += 1,
                Outcome::Unstaged { .. } => self.unstaged += 1,
                Outcome::Repaired => self.repaired += 1,
                Outcome::Deleted { .. } => self.record_deletion(item.item.kind),
                _ => {}
            }
            if !item.is_clean() {
                self.failed_items += 1;
            }
        }
        self.scope_failures += report.scope_failures.len();
        self.pass_count += 1;
        self.total_runtime_secs += report.runtime_secs;
    }

    /// Record an item deletion
    pub fn record_deletion(&mut self, kind: MediaKind) {
        *self.deleted.entry(kind).or_insert(0) += 1;
    }

    /// Get total items deleted across all kinds
    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Janitor Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Passes: {}", self.pass_count),
            format!("Total runtime: {:.1}s", self.total_runtime_secs),
            format!("Staged: {}", self.staged),
            format!("Unstaged: {}", self.unstaged),
            format!("Repaired: {}", self.repaired),
        ];

        if !self.deleted.is_empty() {
            lines.push("Deletions by kind:".to_string());
            for kind in [MediaKind::Series, MediaKind::Movie] {
                if let Some(count) = self.deleted.get(&kind) {
                    lines.push(format!("  {}: {}", kind, count));
                }
            }
            lines.push(format!("  Total: {}", self.total_deleted()));
        }

        if self.failed_items > 0 || self.scope_failures > 0 {
            lines.push(format!(
                "Failures: {} item(s), {} library/sweep",
                self.failed_items, self.scope_failures
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ItemReport, ScopeFailure, Step, StepFailure};
    use chrono::{NaiveDate, Utc};
    use lethe_domain::MediaItem;

    fn report(kind: MediaKind, outcome: Outcome) -> ItemReport {
        ItemReport::new(MediaItem::new("x", "X", kind, "1"), outcome)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = JanitorMetrics::new();
        assert_eq!(metrics.total_deleted(), 0);
        assert_eq!(metrics.pass_count, 0);
    }

    #[test]
    fn test_record_deletion() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_deletion(MediaKind::Movie);
        metrics.record_deletion(MediaKind::Series);
        metrics.record_deletion(MediaKind::Movie);

        assert_eq!(metrics.deleted[&MediaKind::Movie], 2);
        assert_eq!(metrics.deleted[&MediaKind::Series], 1);
        assert_eq!(metrics.total_deleted(), 3);
    }

    #[test]
    fn test_record_pass() {
        let mut pass = PassReport::new(Utc::now(), false);
        pass.runtime_secs = 1.5;
        pass.reconciled
            .push(report(MediaKind::Series, Outcome::Staged { expires_on: date() }));
        pass.reconciled
            .push(report(MediaKind::Series, Outcome::Unstaged { markers_cleared: 1 }));
        let mut deleted = report(MediaKind::Movie, Outcome::Deleted { expires_on: date() });
        deleted
            .failures
            .push(StepFailure::new(Step::RequestCleanup, "timeout"));
        pass.swept.push(deleted);
        pass.scope_failures.push(ScopeFailure {
            scope: "Anime".to_string(),
            message: "not found".to_string(),
        });

        let mut metrics = JanitorMetrics::new();
        metrics.record_pass(&pass);
        metrics.record_pass(&PassReport::new(Utc::now(), false));

        assert_eq!(metrics.staged, 1);
        assert_eq!(metrics.unstaged, 1);
        assert_eq!(metrics.deleted[&MediaKind::Movie], 1);
        assert_eq!(metrics.failed_items, 1);
        assert_eq!(metrics.scope_failures, 1);
        assert_eq!(metrics.pass_count, 2);
        assert!((metrics.total_runtime_secs - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_deletion(MediaKind::Movie);
        metrics.pass_count = 5;

        metrics.reset();

        assert_eq!(metrics.total_deleted(), 0);
        assert_eq!(metrics.pass_count, 0);
    }

    #[test]
    fn test_summary() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_deletion(MediaKind::Series);
        metrics.pass_count = 1;

        let summary = metrics.summary();
        assert!(summary.contains("Janitor Metrics Summary"));
        assert!(summary.contains("Passes: 1"));
        assert!(summary.contains("Series: 1"));
        assert!(!summary.contains("Failures"));
    }
}
