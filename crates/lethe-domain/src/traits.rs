//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the lifecycle logic and the
//! catalog systems it drives. Infrastructure implementations live in
//! `lethe-clients`.

use crate::{ItemId, MediaItem, MediaKind};
use chrono::{DateTime, Utc};

/// Trait for the media server that hosts the libraries, the staging
/// collection and the item tags
///
/// Implemented by the infrastructure layer (`JellyfinClient`)
pub trait LibraryIndex {
    /// Error type for index operations
    type Error: std::fmt::Display;

    /// List the series and movies of a library, by library name
    fn list_items(&self, library: &str) -> Result<Vec<MediaItem>, Self::Error>;

    /// Whether every known user has played the item
    fn is_watched_by_all(&self, item: &ItemId) -> Result<bool, Self::Error>;

    /// When the item was added to the library
    fn added_date(&self, item: &ItemId) -> Result<DateTime<Utc>, Self::Error>;

    /// Whether the item is a member of the named staging collection
    ///
    /// A collection that does not exist yet has no members.
    fn is_in_staging(&self, item: &ItemId, collection: &str) -> Result<bool, Self::Error>;

    /// Add the item to the named staging collection, creating it if needed
    fn add_to_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error>;

    /// Remove the item from the named staging collection
    fn remove_from_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error>;

    /// Tags on the item that start with `prefix`
    fn markers(&self, item: &ItemId, prefix: &str) -> Result<Vec<String>, Self::Error>;

    /// Attach a tag to the item
    fn add_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error>;

    /// Remove a tag from the item
    fn remove_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error>;

    /// Every member of the named staging collection, across all libraries
    fn staged_items(&self, collection: &str) -> Result<Vec<MediaItem>, Self::Error>;
}

/// Entry in a catalog store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Store-internal identifier used for deletion
    pub id: i64,

    /// Title as known to the store
    pub title: String,
}

/// How a catalog store should delete a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Remove the media files from disk
    pub delete_files: bool,

    /// Add an exclusion so import lists never bring the item back
    pub add_exclusion: bool,
}

impl DeleteOptions {
    /// Delete files on disk and leave import lists untouched
    pub fn purge() -> Self {
        Self {
            delete_files: true,
            add_exclusion: false,
        }
    }
}

/// Trait for a type-specific catalog system that owns media files
/// (series store, movie store)
///
/// Implemented by the infrastructure layer (`ArrClient`)
pub trait CatalogStore {
    /// Error type for store operations
    type Error: std::fmt::Display;

    /// Find the record for a provider identifier
    fn lookup_by_external_id(&self, external_id: &str)
        -> Result<Option<CatalogRecord>, Self::Error>;

    /// Irreversibly delete a record
    fn delete(&mut self, record_id: i64, options: DeleteOptions) -> Result<(), Self::Error>;
}

/// Result of asking the request broker to forget an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRemoval {
    /// This many matching requests were deleted
    Removed(usize),

    /// The broker had no request for the item
    NotFound,
}

/// Trait for the system tracking user requests for media
///
/// Implemented by the infrastructure layer (`JellyseerrClient`)
pub trait RequestBroker {
    /// Error type for broker operations
    type Error: std::fmt::Display;

    /// Delete the request records matching an item
    fn delete_request(
        &mut self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<RequestRemoval, Self::Error>;
}
