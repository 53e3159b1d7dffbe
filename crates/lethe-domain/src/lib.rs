//! Lethe Domain Layer
//!
//! This crate contains the core vocabulary of Lethe: the media items it
//! inspects, the per-library deletion rules, the expiration marker that is
//! the only persisted timing state, and the trait interfaces for every
//! external catalog system the janitor talks to.
//!
//! ## Key Concepts
//!
//! - **MediaItem**: A snapshot of a series or movie as reported by the library index
//! - **LibraryRule**: When an item in a library becomes eligible for deletion
//! - **ExpirationMarker**: The deletion due-date, encoded into a tag on the item
//! - **Gateways**: Library index, catalog stores and request broker contracts
//!
//! ## Architecture
//!
//! No HTTP, no configuration, no logging. Infrastructure implementations
//! live in `lethe-clients`; the lifecycle logic lives in `lethe-janitor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kind;
pub mod marker;
pub mod media;
pub mod rule;
pub mod traits;

// Re-exports for convenience
pub use kind::MediaKind;
pub use marker::{ExpirationMarker, MarkerCodec, MarkerError, DEFAULT_MARKER_PREFIX};
pub use media::{ItemId, MediaItem};
pub use rule::LibraryRule;
