//! Media module - the items Lethe evaluates, stages and deletes

use crate::MediaKind;
use std::fmt;

/// Opaque handle of an item inside the library index
///
/// Lethe never interprets the value; it is only passed back to the index
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap a library index handle
    ///
    /// # Examples
    ///
    /// ```
    /// use lethe_domain::ItemId;
    ///
    /// let id = ItemId::new("f27c5d0e");
    /// assert_eq!(id.as_str(), "f27c5d0e");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A series or movie as reported by the library index
///
/// Snapshots are immutable and re-fetched on every pass; nothing about an
/// item is remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Handle in the library index
    pub id: ItemId,

    /// Display name, also the key for exclusion lists
    pub name: String,

    /// Series or movie
    pub kind: MediaKind,

    /// Provider identifier understood by the owning catalog store
    /// (TVDB id for series, TMDB id for movies). Empty when the index has none.
    pub external_id: String,
}

impl MediaItem {
    /// Create a new item snapshot
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        kind: MediaKind,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            external_id: external_id.into(),
        }
    }

    /// Whether the item's name appears verbatim in an exclusion list
    ///
    /// Matching is exact and case-sensitive.
    pub fn is_excluded_by(&self, exclusions: &[String]) -> bool {
        exclusions.iter().any(|name| *name == self.name)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_is_exact_match() {
        let item = MediaItem::new("1", "The Wire", MediaKind::Series, "79126");
        let exclusions = vec!["the wire".to_string(), "The Wire ".to_string()];
        assert!(!item.is_excluded_by(&exclusions));

        let exclusions = vec!["Other".to_string(), "The Wire".to_string()];
        assert!(item.is_excluded_by(&exclusions));
    }

    #[test]
    fn test_empty_exclusions() {
        let item = MediaItem::new("1", "Heat", MediaKind::Movie, "949");
        assert!(!item.is_excluded_by(&[]));
    }
}
