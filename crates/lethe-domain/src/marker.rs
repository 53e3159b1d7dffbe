//! Expiration marker module
//!
//! The marker is the only timing state Lethe persists. It lives as a tag on
//! the item inside the library index, shaped `<prefix><YYYY-MM-DD>`, and
//! carries a calendar date with no time of day: an item becomes due at the
//! start of that day.
//!
//! Only [`MarkerCodec`] knows the tag shape. Everything else works with
//! [`ExpirationMarker`] values and dates.

use chrono::NaiveDate;
use thiserror::Error;

/// Prefix used when none is configured
pub const DEFAULT_MARKER_PREFIX: &str = "Lethe-Expires-";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while building or decoding a marker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// The codec was configured with an empty prefix
    #[error("Marker prefix must not be empty")]
    EmptyPrefix,

    /// The tag does not start with the codec's prefix
    #[error("Tag '{0}' is not an expiration marker")]
    MissingPrefix(String),

    /// The expiry date falls outside the representable calendar
    #[error("Expiry {delay_days} days after {today} is out of range")]
    OutOfRange {
        /// Day the delay starts from
        today: NaiveDate,
        /// Requested delay
        delay_days: u32,
    },

    /// The tag has the prefix but no parseable date after it
    #[error("Marker '{raw}' has an invalid date: {reason}")]
    InvalidDate {
        /// The offending tag
        raw: String,
        /// Parser message
        reason: String,
    },
}

/// Deletion due-date attached to a staged item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpirationMarker {
    expires_on: NaiveDate,
}

impl ExpirationMarker {
    /// Create a marker expiring on the given day
    pub fn new(expires_on: NaiveDate) -> Self {
        Self { expires_on }
    }

    /// Create a marker expiring `delay_days` after `today`
    ///
    /// # Errors
    /// Returns [`MarkerError::OutOfRange`] when the date cannot be represented.
    pub fn after(today: NaiveDate, delay_days: u32) -> Result<Self, MarkerError> {
        today
            .checked_add_days(chrono::Days::new(u64::from(delay_days)))
            .map(Self::new)
            .ok_or(MarkerError::OutOfRange { today, delay_days })
    }

    /// Day on which the item becomes due
    pub fn expires_on(&self) -> NaiveDate {
        self.expires_on
    }

    /// Whether the item is due on `today`
    ///
    /// Due from the start of the expiration day onwards.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        today >= self.expires_on
    }
}

/// Encoder/decoder between [`ExpirationMarker`] and its tag string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCodec {
    prefix: String,
}

impl MarkerCodec {
    /// Create a codec for the given tag prefix
    ///
    /// # Errors
    /// Returns [`MarkerError::EmptyPrefix`] when the prefix is empty, since
    /// every tag on every item would then look like a marker.
    pub fn new(prefix: impl Into<String>) -> Result<Self, MarkerError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(MarkerError::EmptyPrefix);
        }
        Ok(Self { prefix })
    }

    /// The tag prefix identifying markers
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a tag belongs to this codec, regardless of whether it decodes
    pub fn is_marker(&self, tag: &str) -> bool {
        tag.starts_with(&self.prefix)
    }

    /// Render a marker as a tag
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use lethe_domain::{ExpirationMarker, MarkerCodec};
    ///
    /// let codec = MarkerCodec::default();
    /// let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    /// assert_eq!(codec.encode(&ExpirationMarker::new(date)), "Lethe-Expires-2025-03-09");
    /// ```
    pub fn encode(&self, marker: &ExpirationMarker) -> String {
        format!("{}{}", self.prefix, marker.expires_on.format(DATE_FORMAT))
    }

    /// Parse a tag back into a marker
    ///
    /// Never panics; malformed tags come back as an error for the caller to
    /// log and skip.
    pub fn decode(&self, tag: &str) -> Result<ExpirationMarker, MarkerError> {
        let date = tag
            .strip_prefix(&self.prefix)
            .ok_or_else(|| MarkerError::MissingPrefix(tag.to_string()))?;

        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map(ExpirationMarker::new)
            .map_err(|e| MarkerError::InvalidDate {
                raw: tag.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for MarkerCodec {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_MARKER_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decode_valid_marker() {
        let codec = MarkerCodec::default();
        let marker = codec.decode("Lethe-Expires-2024-12-31").unwrap();
        assert_eq!(marker.expires_on(), date(2024, 12, 31));
    }

    #[test]
    fn test_decode_rejects_foreign_tag() {
        let codec = MarkerCodec::default();
        assert_eq!(
            codec.decode("favourite"),
            Err(MarkerError::MissingPrefix("favourite".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_bad_date() {
        let codec = MarkerCodec::default();
        for tag in [
            "Lethe-Expires-",
            "Lethe-Expires-2024-02-30",
            "Lethe-Expires-tomorrow",
            "Lethe-Expires-2024-01-01T10:00:00Z",
        ] {
            assert!(
                matches!(codec.decode(tag), Err(MarkerError::InvalidDate { .. })),
                "{tag} should not decode"
            );
        }
    }

    #[test]
    fn test_custom_prefix() {
        let codec = MarkerCodec::new("Headed-Out:").unwrap();
        let tag = codec.encode(&ExpirationMarker::new(date(2025, 1, 2)));
        assert_eq!(tag, "Headed-Out:2025-01-02");
        assert!(codec.is_marker(&tag));
        assert!(!MarkerCodec::default().is_marker(&tag));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert_eq!(MarkerCodec::new(""), Err(MarkerError::EmptyPrefix));
    }

    #[test]
    fn test_after_adds_whole_days() {
        let marker = ExpirationMarker::after(date(2024, 2, 26), 7).unwrap();
        assert_eq!(marker.expires_on(), date(2024, 3, 4));
    }

    #[test]
    fn test_after_out_of_range_is_error() {
        let result = ExpirationMarker::after(date(2024, 2, 26), u32::MAX);
        assert!(matches!(result, Err(MarkerError::OutOfRange { delay_days: u32::MAX, .. })));
    }

    #[test]
    fn test_due_from_start_of_day() {
        let marker = ExpirationMarker::new(date(2024, 6, 10));
        assert!(!marker.is_due(date(2024, 6, 9)));
        assert!(marker.is_due(date(2024, 6, 10)));
        assert!(marker.is_due(date(2024, 7, 1)));
    }

    proptest! {
        #[test]
        fn decode_never_panics(tag in ".*") {
            let codec = MarkerCodec::default();
            let _ = codec.decode(&tag);
            let prefixed = format!("{}{}", DEFAULT_MARKER_PREFIX, tag);
            let _ = codec.decode(&prefixed);
        }
    }
}
