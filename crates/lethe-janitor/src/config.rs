//! Configuration for Janitor operations
//!
//! Defines the staging collection, grace period, pass interval and the
//! per-library deletion rules.

use crate::JanitorError;
use lethe_domain::{LibraryRule, MarkerCodec, DEFAULT_MARKER_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Staging collection name used when none is configured
pub const DEFAULT_STAGING_COLLECTION: &str = "Headed Out";

/// Grace period used when none is configured
pub const DEFAULT_DELETION_DELAY_DAYS: u32 = 7;

/// Pass interval used when none is configured
pub const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 24;

/// Longest accepted grace period (100 years)
pub const MAX_DELETION_DELAY_DAYS: u32 = 36_500;

/// Longest accepted pass interval (one year)
pub const MAX_CHECK_INTERVAL_HOURS: u64 = 8_760;

/// Deletion rule and exclusions for one library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPolicy {
    /// Library name as shown by the media server
    pub name: String,

    /// Stage items once every user has played them
    #[serde(default)]
    pub delete_if_watched_by_all: bool,

    /// Stage items older than this many days (0 disables)
    #[serde(default)]
    pub max_age_days: u32,

    /// Item names that are never staged (exact, case-sensitive)
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl LibraryPolicy {
    /// The eligibility rule of this library
    pub fn rule(&self) -> LibraryRule {
        LibraryRule {
            delete_if_watched_by_all: self.delete_if_watched_by_all,
            max_age_days: self.max_age_days,
        }
    }
}

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use lethe_janitor::JanitorConfig;
///
/// let config = JanitorConfig::default();
/// assert_eq!(config.staging_collection, "Headed Out");
/// assert_eq!(config.deletion_delay_days, 7);
/// assert!(config.libraries.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Name of the playlist that marks items pending deletion
    /// Default: "Headed Out"
    #[serde(default = "default_staging_collection")]
    pub staging_collection: String,

    /// Days between staging an item and deleting it
    /// Default: 7
    #[serde(default = "default_deletion_delay_days")]
    pub deletion_delay_days: u32,

    /// Hours between two passes in daemon mode
    /// Default: 24
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u64,

    /// Tag prefix of expiration markers
    /// Default: "Lethe-Expires-"
    #[serde(default = "default_marker_prefix")]
    pub marker_prefix: String,

    /// Dry-run mode: read and decide, but change nothing anywhere
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Libraries to reconcile, in order
    #[serde(default)]
    pub libraries: Vec<LibraryPolicy>,
}

fn default_staging_collection() -> String {
    DEFAULT_STAGING_COLLECTION.to_string()
}

fn default_deletion_delay_days() -> u32 {
    DEFAULT_DELETION_DELAY_DAYS
}

fn default_check_interval_hours() -> u64 {
    DEFAULT_CHECK_INTERVAL_HOURS
}

fn default_marker_prefix() -> String {
    DEFAULT_MARKER_PREFIX.to_string()
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            staging_collection: default_staging_collection(),
            deletion_delay_days: DEFAULT_DELETION_DELAY_DAYS,
            check_interval_hours: DEFAULT_CHECK_INTERVAL_HOURS,
            marker_prefix: default_marker_prefix(),
            dry_run: false,
            libraries: Vec::new(),
        }
    }
}

impl JanitorConfig {
    /// Replace empty or zero settings with their defaults
    ///
    /// A zero grace period or interval is treated as "not set" rather than
    /// as "delete immediately" / "loop without pause".
    pub fn with_defaults(mut self) -> Self {
        if self.staging_collection.trim().is_empty() {
            self.staging_collection = default_staging_collection();
        }
        if self.deletion_delay_days == 0 {
            self.deletion_delay_days = DEFAULT_DELETION_DELAY_DAYS;
        }
        if self.check_interval_hours == 0 {
            self.check_interval_hours = DEFAULT_CHECK_INTERVAL_HOURS;
        }
        self
    }

    /// Check the configuration for settings no pass could work with
    pub fn validate(&self) -> Result<(), JanitorError> {
        self.codec()?;

        if self.deletion_delay_days > MAX_DELETION_DELAY_DAYS {
            return Err(JanitorError::Config(format!(
                "deletion_delay_days must be at most {}, got {}",
                MAX_DELETION_DELAY_DAYS, self.deletion_delay_days
            )));
        }
        if self.check_interval_hours > MAX_CHECK_INTERVAL_HOURS {
            return Err(JanitorError::Config(format!(
                "check_interval_hours must be at most {}, got {}",
                MAX_CHECK_INTERVAL_HOURS, self.check_interval_hours
            )));
        }

        let mut seen = HashSet::new();
        for library in &self.libraries {
            if library.name.trim().is_empty() {
                return Err(JanitorError::Config(
                    "library name must not be empty".to_string(),
                ));
            }
            if !seen.insert(library.name.as_str()) {
                return Err(JanitorError::Config(format!(
                    "library '{}' is configured twice",
                    library.name
                )));
            }
            if !library.rule().is_active() {
                tracing::warn!(
                    "Library '{}' has no active rule; nothing in it will be staged",
                    library.name
                );
            }
        }

        Ok(())
    }

    /// Marker codec for the configured prefix
    pub fn codec(&self) -> Result<MarkerCodec, JanitorError> {
        Ok(MarkerCodec::new(self.marker_prefix.clone())?)
    }

    /// Get the pass interval as Duration
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_hours.saturating_mul(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(name: &str) -> LibraryPolicy {
        LibraryPolicy {
            name: name.to_string(),
            delete_if_watched_by_all: true,
            max_age_days: 0,
            exclusions: Vec::new(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = JanitorConfig::default();
        assert_eq!(config.staging_collection, DEFAULT_STAGING_COLLECTION);
        assert_eq!(config.deletion_delay_days, 7);
        assert_eq!(config.check_interval_hours, 24);
        assert_eq!(config.marker_prefix, DEFAULT_MARKER_PREFIX);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let config = JanitorConfig {
            staging_collection: "  ".to_string(),
            deletion_delay_days: 0,
            check_interval_hours: 0,
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(config.staging_collection, "Headed Out");
        assert_eq!(config.deletion_delay_days, 7);
        assert_eq!(config.check_interval_hours, 24);
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = JanitorConfig {
            marker_prefix: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(JanitorError::Config(_))));
    }

    #[test]
    fn test_duplicate_library_rejected() {
        let config = JanitorConfig {
            libraries: vec![policy("Movies"), policy("Movies")],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("configured twice"));
    }

    #[test]
    fn test_deletion_delay_upper_bound() {
        let at_bound = JanitorConfig {
            deletion_delay_days: MAX_DELETION_DELAY_DAYS,
            ..Default::default()
        };
        assert!(at_bound.validate().is_ok());

        let config = JanitorConfig {
            deletion_delay_days: u32::MAX,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("deletion_delay_days"));
    }

    #[test]
    fn test_check_interval_upper_bound() {
        let at_bound = JanitorConfig {
            check_interval_hours: MAX_CHECK_INTERVAL_HOURS,
            ..Default::default()
        };
        assert!(at_bound.validate().is_ok());

        let config = JanitorConfig {
            check_interval_hours: u64::MAX,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("check_interval_hours"));
    }

    #[test]
    fn test_check_interval_saturates() {
        let config = JanitorConfig {
            check_interval_hours: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.check_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_duration_conversion() {
        let config = JanitorConfig {
            check_interval_hours: 6,
            ..Default::default()
        };
        assert_eq!(config.check_interval(), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_parse_toml_with_partial_fields() {
        let toml = r#"
            staging_collection = "Leaving Soon"
            dry_run = true

            [[libraries]]
            name = "Shows"
            delete_if_watched_by_all = true
            exclusions = ["The Wire"]

            [[libraries]]
            name = "Movies"
            max_age_days = 180
        "#;

        let config: JanitorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.staging_collection, "Leaving Soon");
        assert_eq!(config.deletion_delay_days, 7);
        assert!(config.dry_run);
        assert_eq!(config.libraries.len(), 2);
        assert_eq!(config.libraries[0].exclusions, vec!["The Wire"]);
        assert_eq!(
            config.libraries[1].rule(),
            LibraryRule {
                delete_if_watched_by_all: false,
                max_age_days: 180
            }
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = JanitorConfig {
            libraries: vec![policy("Shows")],
            ..Default::default()
        };
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: JanitorConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config.staging_collection, deserialized.staging_collection);
        assert_eq!(config.libraries, deserialized.libraries);
    }
}
