//! Error types for Janitor operations

use thiserror::Error;

/// Errors that can occur during Janitor operations
///
/// Per-item problems never surface here; they are recorded on the pass
/// report instead.
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<lethe_domain::MarkerError> for JanitorError {
    fn from(e: lethe_domain::MarkerError) -> Self {
        JanitorError::Config(e.to_string())
    }
}
