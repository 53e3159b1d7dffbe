//! Lethe Janitor
//!
//! Staged deletion of media library items: decide what qualifies for removal,
//! hold it in a staging collection for a grace period, then delete it across
//! every system that knows about it.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Eligibility**: deciding per item whether its library's rule is met
//! - **Reconciliation**: bringing staging membership and expiration markers in
//!   line with eligibility
//! - **Sweeping**: deleting staged items whose grace period has passed
//! - **Metrics collection**: tracking what passes did for monitoring
//!
//! # Architecture
//!
//! No state is kept between runs. The "pending deletion" decision lives in
//! the library index itself: membership of the staging collection plus one
//! expiration marker tag per staged item. Every pass re-reads both.
//!
//! ## Item lifecycle
//!
//! | State | Eligible | Action |
//! |-------|----------|--------|
//! | **Unstaged** | yes | stage, write marker `today + deletion_delay_days` |
//! | **Unstaged** | no | nothing |
//! | **Staged** | yes | nothing (the marker is never extended) |
//! | **Staged** | no | unstage, clear every marker |
//! | **Staged**, marker due | - | delete from catalog store, unstage, clear markers, drop requests |
//!
//! # Usage
//!
//! ## One-time Pass
//!
//! ```
//! use chrono::Utc;
//! use lethe_clients::memory::{MemoryBroker, MemoryCatalog, MemoryLibrary};
//! use lethe_janitor::{Backends, Janitor, JanitorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut janitor = Janitor::new(JanitorConfig::default())?;
//! let mut backends = Backends {
//!     library: MemoryLibrary::new(),
//!     series: MemoryCatalog::new(),
//!     movies: MemoryCatalog::new(),
//!     requests: MemoryBroker::new(),
//! };
//!
//! let report = janitor.run_pass(&mut backends, Utc::now());
//! println!("{} items swept", report.swept.len());
//! println!("{}", janitor.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! See [`JanitorWorker`].
//!
//! # Configuration
//!
//! The Janitor can be configured via TOML:
//!
//! ```toml
//! [janitor]
//! staging_collection = "Headed Out"
//! deletion_delay_days = 7
//! check_interval_hours = 24
//! marker_prefix = "Lethe-Expires-"
//! dry_run = false
//!
//! [[janitor.libraries]]
//! name = "Movies"
//! max_age_days = 180
//! exclusions = ["Heat"]
//! ```

#![warn(missing_docs)]

mod config;
pub mod eligibility;
mod error;
mod janitor;
mod metrics;
pub mod reconciler;
pub mod report;
pub mod sweep;
mod worker;

pub use config::{
    JanitorConfig, LibraryPolicy, DEFAULT_CHECK_INTERVAL_HOURS, DEFAULT_DELETION_DELAY_DAYS,
    DEFAULT_STAGING_COLLECTION, MAX_CHECK_INTERVAL_HOURS, MAX_DELETION_DELAY_DAYS,
};
pub use error::JanitorError;
pub use janitor::{Backends, Janitor, PassContext};
pub use metrics::JanitorMetrics;
pub use report::{
    ItemReport, Outcome, PassReport, ScopeFailure, StagedEntry, Step, StepFailure,
};
pub use worker::JanitorWorker;
