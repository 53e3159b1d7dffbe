//! Lethe Catalog Clients
//!
//! Gateway implementations of the traits from `lethe-domain`.
//!
//! # Architecture
//!
//! Every client is a plain struct constructed with its endpoint, API key and
//! request timeout, then handed to the janitor. Calls are synchronous and
//! blocking; each HTTP request carries the configured timeout and a failure
//! surfaces as a [`ClientError`] for the caller to record.
//!
//! # Clients
//!
//! - `JellyfinClient`: library index, staging playlist and item tags
//! - `ArrClient`: Sonarr (series) or Radarr (movie) catalog store
//! - `JellyseerrClient`: request broker
//! - `memory`: in-memory gateways for tests and dry experiments
//!
//! # Examples
//!
//! ```no_run
//! use lethe_clients::{ArrClient, ArrFlavor, DEFAULT_TIMEOUT_SECS};
//! use lethe_domain::traits::CatalogStore;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), lethe_clients::ClientError> {
//! let sonarr = ArrClient::new(
//!     ArrFlavor::Sonarr,
//!     "http://localhost:8989/",
//!     "api-key",
//!     Duration::from_secs(DEFAULT_TIMEOUT_SECS),
//! )?;
//! let record = sonarr.lookup_by_external_id("79126")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod arr;
mod http;
pub mod jellyfin;
pub mod jellyseerr;
pub mod memory;

use thiserror::Error;

pub use arr::{ArrClient, ArrFlavor};
pub use http::DEFAULT_TIMEOUT_SECS;
pub use jellyfin::JellyfinClient;
pub use jellyseerr::JellyseerrClient;

/// Errors that can occur while talking to a catalog backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure, timeout, or client construction failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code returned by the backend
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// A named resource (library, playlist, item) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a body we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The item's provider identifier is not a number
    #[error("Invalid external id '{0}'")]
    InvalidExternalId(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Http(format!("Request timed out: {}", e))
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            ClientError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::InvalidResponse(format!("JSON parsing error: {}", e))
    }
}

/// Parse a numeric provider identifier
pub(crate) fn parse_external_id(external_id: &str) -> Result<i64, ClientError> {
    external_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ClientError::InvalidExternalId(external_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_external_id() {
        assert_eq!(parse_external_id("79126").unwrap(), 79126);
        assert_eq!(parse_external_id(" 603 ").unwrap(), 603);
        assert!(matches!(
            parse_external_id(""),
            Err(ClientError::InvalidExternalId(_))
        ));
        assert!(matches!(
            parse_external_id("tt0133093"),
            Err(ClientError::InvalidExternalId(_))
        ));
    }

    #[test]
    fn test_status_error_display() {
        let err = ClientError::Status {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }
}
