//! In-memory gateways
//!
//! Deterministic stand-ins for the HTTP clients. They keep the same state the
//! real backends keep (staging membership, tags, catalog records, requests),
//! record every mutation, and can be told to fail any operation.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use lethe_clients::memory::{LibraryOp, MemoryLibrary};
//! use lethe_domain::traits::LibraryIndex;
//! use lethe_domain::{ItemId, MediaItem, MediaKind};
//!
//! let mut library = MemoryLibrary::new();
//! library.add_item("Movies", MediaItem::new("m1", "Heat", MediaKind::Movie, "949"), Utc::now());
//!
//! library.add_to_staging(&ItemId::new("m1"), "Headed Out").unwrap();
//! assert!(library.is_staged(&ItemId::new("m1"), "Headed Out"));
//!
//! library.fail(LibraryOp::AddMarker);
//! assert!(library.add_marker(&ItemId::new("m1"), "Lethe-Expires-2030-01-01").is_err());
//! ```

use chrono::{DateTime, Utc};
use lethe_domain::traits::{
    CatalogRecord, CatalogStore, DeleteOptions, LibraryIndex, RequestBroker, RequestRemoval,
};
use lethe_domain::{ItemId, MediaItem, MediaKind};
use std::collections::{BTreeMap, HashSet};

/// Operations of [`MemoryLibrary`] that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryOp {
    /// `list_items`
    ListItems,
    /// `is_watched_by_all`
    WatchedByAll,
    /// `added_date`
    AddedDate,
    /// `is_in_staging`
    IsInStaging,
    /// `add_to_staging`
    AddToStaging,
    /// `remove_from_staging`
    RemoveFromStaging,
    /// `markers`
    Markers,
    /// `add_marker`
    AddMarker,
    /// `remove_marker`
    RemoveMarker,
    /// `staged_items`
    StagedItems,
}

/// A state change performed through the [`LibraryIndex`] trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Item added to a staging collection
    AddToStaging(ItemId),
    /// Item removed from a staging collection
    RemoveFromStaging(ItemId),
    /// Tag attached to an item
    AddMarker(ItemId, String),
    /// Tag removed from an item
    RemoveMarker(ItemId, String),
}

#[derive(Debug, Clone)]
struct Entry {
    library: String,
    item: MediaItem,
    watched_by_all: bool,
    added: DateTime<Utc>,
    tags: Vec<String>,
}

/// In-memory library index
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    entries: Vec<Entry>,
    collections: BTreeMap<String, Vec<ItemId>>,
    failing: HashSet<LibraryOp>,
    mutations: Vec<Mutation>,
}

impl MemoryLibrary {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to a library
    pub fn add_item(&mut self, library: &str, item: MediaItem, added: DateTime<Utc>) {
        self.entries.push(Entry {
            library: library.to_string(),
            item,
            watched_by_all: false,
            added,
            tags: Vec::new(),
        });
    }

    /// Remove an item from the index altogether
    pub fn remove_item(&mut self, item: &ItemId) {
        self.entries.retain(|entry| entry.item.id != *item);
        for members in self.collections.values_mut() {
            members.retain(|member| member != item);
        }
    }

    /// Set the watched-by-all state of an item
    pub fn set_watched_by_all(&mut self, item: &ItemId, watched: bool) {
        if let Some(entry) = self.entry_mut(item) {
            entry.watched_by_all = watched;
        }
    }

    /// Set the added date of an item
    pub fn set_added(&mut self, item: &ItemId, added: DateTime<Utc>) {
        if let Some(entry) = self.entry_mut(item) {
            entry.added = added;
        }
    }

    /// Put an item in a collection without recording a mutation
    pub fn seed_staged(&mut self, item: &ItemId, collection: &str) {
        let members = self.collections.entry(collection.to_string()).or_default();
        if !members.contains(item) {
            members.push(item.clone());
        }
    }

    /// Attach a tag without recording a mutation
    pub fn seed_tag(&mut self, item: &ItemId, tag: &str) {
        if let Some(entry) = self.entry_mut(item) {
            entry.tags.push(tag.to_string());
        }
    }

    /// Make an operation fail until [`MemoryLibrary::recover`] is called
    pub fn fail(&mut self, op: LibraryOp) {
        self.failing.insert(op);
    }

    /// Let a failing operation succeed again
    pub fn recover(&mut self, op: LibraryOp) {
        self.failing.remove(&op);
    }

    /// Whether an item is a member of a collection
    pub fn is_staged(&self, item: &ItemId, collection: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|members| members.contains(item))
    }

    /// Every tag currently on an item
    pub fn tags(&self, item: &ItemId) -> Vec<String> {
        self.entry(item)
            .map(|entry| entry.tags.clone())
            .unwrap_or_default()
    }

    /// Mutations performed through the trait, oldest first
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Forget recorded mutations
    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    fn entry(&self, item: &ItemId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.item.id == *item)
    }

    fn entry_mut(&mut self, item: &ItemId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.item.id == *item)
    }

    fn check(&self, op: LibraryOp) -> Result<(), String> {
        if self.failing.contains(&op) {
            return Err(format!("{:?} failed (injected)", op));
        }
        Ok(())
    }

    fn known(&self, item: &ItemId) -> Result<&Entry, String> {
        self.entry(item)
            .ok_or_else(|| format!("Unknown item {}", item))
    }
}

impl LibraryIndex for MemoryLibrary {
    type Error = String;

    fn list_items(&self, library: &str) -> Result<Vec<MediaItem>, Self::Error> {
        self.check(LibraryOp::ListItems)?;
        if !self.entries.iter().any(|entry| entry.library == library) {
            return Err(format!("Library not found: {}", library));
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.library == library)
            .map(|entry| entry.item.clone())
            .collect())
    }

    fn is_watched_by_all(&self, item: &ItemId) -> Result<bool, Self::Error> {
        self.check(LibraryOp::WatchedByAll)?;
        Ok(self.known(item)?.watched_by_all)
    }

    fn added_date(&self, item: &ItemId) -> Result<DateTime<Utc>, Self::Error> {
        self.check(LibraryOp::AddedDate)?;
        Ok(self.known(item)?.added)
    }

    fn is_in_staging(&self, item: &ItemId, collection: &str) -> Result<bool, Self::Error> {
        self.check(LibraryOp::IsInStaging)?;
        Ok(self.is_staged(item, collection))
    }

    fn add_to_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error> {
        self.check(LibraryOp::AddToStaging)?;
        self.known(item)?;
        self.seed_staged(item, collection);
        self.mutations.push(Mutation::AddToStaging(item.clone()));
        Ok(())
    }

    fn remove_from_staging(&mut self, item: &ItemId, collection: &str) -> Result<(), Self::Error> {
        self.check(LibraryOp::RemoveFromStaging)?;
        let members = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| format!("Collection not found: {}", collection))?;
        members.retain(|member| member != item);
        self.mutations.push(Mutation::RemoveFromStaging(item.clone()));
        Ok(())
    }

    fn markers(&self, item: &ItemId, prefix: &str) -> Result<Vec<String>, Self::Error> {
        self.check(LibraryOp::Markers)?;
        Ok(self
            .known(item)?
            .tags
            .iter()
            .filter(|tag| tag.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn add_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error> {
        self.check(LibraryOp::AddMarker)?;
        self.known(item)?;
        self.seed_tag(item, marker);
        self.mutations
            .push(Mutation::AddMarker(item.clone(), marker.to_string()));
        Ok(())
    }

    fn remove_marker(&mut self, item: &ItemId, marker: &str) -> Result<(), Self::Error> {
        self.check(LibraryOp::RemoveMarker)?;
        self.known(item)?;
        if let Some(entry) = self.entry_mut(item) {
            entry.tags.retain(|tag| tag != marker);
        }
        self.mutations
            .push(Mutation::RemoveMarker(item.clone(), marker.to_string()));
        Ok(())
    }

    fn staged_items(&self, collection: &str) -> Result<Vec<MediaItem>, Self::Error> {
        self.check(LibraryOp::StagedItems)?;
        let Some(members) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(members
            .iter()
            .filter_map(|id| self.entry(id).map(|entry| entry.item.clone()))
            .collect())
    }
}

/// In-memory catalog store (series or movie)
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: Vec<(String, CatalogRecord)>,
    deletions: Vec<(i64, DeleteOptions)>,
    next_id: i64,
    fail_lookups: bool,
    fail_deletes: bool,
}

impl MemoryCatalog {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record for a provider id, returning its store id
    pub fn add_record(&mut self, external_id: &str, title: &str) -> i64 {
        self.next_id += 1;
        self.records.push((
            external_id.to_string(),
            CatalogRecord {
                id: self.next_id,
                title: title.to_string(),
            },
        ));
        self.next_id
    }

    /// Whether a record for the provider id still exists
    pub fn contains(&self, external_id: &str) -> bool {
        self.records.iter().any(|(id, _)| id == external_id)
    }

    /// Deletions performed so far, oldest first
    pub fn deletions(&self) -> &[(i64, DeleteOptions)] {
        &self.deletions
    }

    /// Make lookups fail (or succeed again)
    pub fn set_failing_lookups(&mut self, failing: bool) {
        self.fail_lookups = failing;
    }

    /// Make deletions fail (or succeed again)
    pub fn set_failing_deletes(&mut self, failing: bool) {
        self.fail_deletes = failing;
    }
}

impl CatalogStore for MemoryCatalog {
    type Error = String;

    fn lookup_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CatalogRecord>, Self::Error> {
        if self.fail_lookups {
            return Err("Lookup failed (injected)".to_string());
        }
        Ok(self
            .records
            .iter()
            .find(|(id, _)| id == external_id)
            .map(|(_, record)| record.clone()))
    }

    fn delete(&mut self, record_id: i64, options: DeleteOptions) -> Result<(), Self::Error> {
        if self.fail_deletes {
            return Err("Delete failed (injected)".to_string());
        }
        let position = self
            .records
            .iter()
            .position(|(_, record)| record.id == record_id)
            .ok_or_else(|| format!("No record with id {}", record_id))?;
        self.records.remove(position);
        self.deletions.push((record_id, options));
        Ok(())
    }
}

/// In-memory request broker
#[derive(Debug, Default)]
pub struct MemoryBroker {
    requests: Vec<(String, MediaKind)>,
    calls: usize,
    failing: bool,
}

impl MemoryBroker {
    /// Create a broker with no requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user request for an item
    pub fn add_request(&mut self, external_id: &str, kind: MediaKind) {
        self.requests.push((external_id.to_string(), kind));
    }

    /// Number of requests still held
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    /// Number of `delete_request` calls received
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Make every call fail (or succeed again)
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl RequestBroker for MemoryBroker {
    type Error = String;

    fn delete_request(
        &mut self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<RequestRemoval, Self::Error> {
        self.calls += 1;
        if self.failing {
            return Err("Broker unavailable (injected)".to_string());
        }

        let before = self.requests.len();
        self.requests
            .retain(|(id, k)| !(id == external_id && *k == kind));
        let removed = before - self.requests.len();

        if removed == 0 {
            Ok(RequestRemoval::NotFound)
        } else {
            Ok(RequestRemoval::Removed(removed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str) -> MediaItem {
        MediaItem::new(id, format!("Movie {}", id), MediaKind::Movie, "100")
    }

    #[test]
    fn test_library_records_mutations_only_through_trait() {
        let mut library = MemoryLibrary::new();
        library.add_item("Movies", movie("m1"), Utc::now());
        let id = ItemId::new("m1");

        library.seed_staged(&id, "Headed Out");
        library.seed_tag(&id, "Lethe-Expires-2030-01-01");
        assert!(library.mutations().is_empty());

        library.remove_from_staging(&id, "Headed Out").unwrap();
        library.remove_marker(&id, "Lethe-Expires-2030-01-01").unwrap();
        assert_eq!(library.mutations().len(), 2);
        assert!(!library.is_staged(&id, "Headed Out"));
        assert!(library.tags(&id).is_empty());
    }

    #[test]
    fn test_markers_filtered_by_prefix() {
        let mut library = MemoryLibrary::new();
        library.add_item("Movies", movie("m1"), Utc::now());
        let id = ItemId::new("m1");
        library.seed_tag(&id, "hbo");
        library.seed_tag(&id, "Lethe-Expires-2030-01-01");

        let markers = library.markers(&id, "Lethe-Expires-").unwrap();
        assert_eq!(markers, vec!["Lethe-Expires-2030-01-01".to_string()]);
    }

    #[test]
    fn test_injected_failure_and_recovery() {
        let mut library = MemoryLibrary::new();
        library.add_item("Movies", movie("m1"), Utc::now());
        library.fail(LibraryOp::ListItems);
        assert!(library.list_items("Movies").is_err());
        library.recover(LibraryOp::ListItems);
        assert_eq!(library.list_items("Movies").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_library_is_error() {
        let library = MemoryLibrary::new();
        assert!(library.list_items("Nope").is_err());
    }

    #[test]
    fn test_catalog_delete_removes_record() {
        let mut catalog = MemoryCatalog::new();
        let id = catalog.add_record("949", "Heat");

        let record = catalog.lookup_by_external_id("949").unwrap().unwrap();
        assert_eq!(record.id, id);

        catalog.delete(id, DeleteOptions::purge()).unwrap();
        assert!(!catalog.contains("949"));
        assert_eq!(catalog.deletions(), &[(id, DeleteOptions::purge())]);
        assert!(catalog.lookup_by_external_id("949").unwrap().is_none());
    }

    #[test]
    fn test_broker_matches_kind() {
        let mut broker = MemoryBroker::new();
        broker.add_request("949", MediaKind::Movie);

        assert_eq!(
            broker.delete_request("949", MediaKind::Series).unwrap(),
            RequestRemoval::NotFound
        );
        assert_eq!(
            broker.delete_request("949", MediaKind::Movie).unwrap(),
            RequestRemoval::Removed(1)
        );
        assert_eq!(broker.pending(), 0);
        assert_eq!(broker.calls(), 2);
    }
}
