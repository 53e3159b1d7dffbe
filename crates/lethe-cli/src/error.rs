//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required environment variable not set
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    /// A backend could not be read
    #[error("Backend error: {0}")]
    Backend(String),

    /// Janitor error
    #[error(transparent)]
    Janitor(#[from] lethe_janitor::JanitorError),

    /// Backend client error
    #[error("Client error: {0}")]
    Client(#[from] lethe_clients::ClientError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
