//! Configuration management for the CLI.
//!
//! Endpoints and janitor settings come from a TOML file; API keys come from
//! the environment so the file can be shared without secrets.

use crate::error::{CliError, Result};
use lethe_clients::DEFAULT_TIMEOUT_SECS;
use lethe_janitor::JanitorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the Jellyfin API key
pub const JELLYFIN_API_KEY: &str = "JELLYFIN_API_KEY";
/// Environment variable holding the Sonarr API key
pub const SONARR_API_KEY: &str = "SONARR_API_KEY";
/// Environment variable holding the Radarr API key
pub const RADARR_API_KEY: &str = "RADARR_API_KEY";
/// Environment variable holding the Jellyseerr API key
pub const JELLYSEERR_API_KEY: &str = "JELLYSEERR_API_KEY";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Library index
    pub jellyfin: JellyfinSettings,

    /// Series store
    pub sonarr: ServiceSettings,

    /// Movie store
    pub radarr: ServiceSettings,

    /// Request broker
    pub jellyseerr: ServiceSettings,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Janitor settings and library rules
    #[serde(default)]
    pub janitor: JanitorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Jellyfin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JellyfinSettings {
    /// Base URL
    pub url: String,

    /// User owning the staging playlist; first administrator when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Endpoint of an API-key service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL
    pub url: String,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// API keys read from the environment.
#[derive(Clone)]
pub struct ApiKeys {
    /// Jellyfin API key
    pub jellyfin: String,
    /// Sonarr API key
    pub sonarr: String,
    /// Radarr API key
    pub radarr: String,
    /// Jellyseerr API key
    pub jellyseerr: String,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKeys { .. }")
    }
}

impl ApiKeys {
    /// Read every key from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read every key through a lookup function.
    ///
    /// Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| CliError::MissingEnv(name.to_string()))
        };

        Ok(Self {
            jellyfin: key(JELLYFIN_API_KEY)?,
            sonarr: key(SONARR_API_KEY)?,
            radarr: key(RADARR_API_KEY)?,
            jellyseerr: key(JELLYSEERR_API_KEY)?,
        })
    }
}

impl AppConfig {
    /// Load and validate configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Could not read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.janitor = config.janitor.with_defaults();
        if config.http.timeout_secs == 0 {
            config.http.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that every endpoint is usable and the janitor settings are valid.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in self.endpoints() {
            let url = url.trim();
            if url.is_empty() {
                return Err(CliError::Config(format!("{}.url is required", name)));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CliError::Config(format!(
                    "{}.url must start with http:// or https://, got '{}'",
                    name, url
                )));
            }
        }

        self.janitor.validate()?;
        Ok(())
    }

    /// Backend names and their URLs.
    pub fn endpoints(&self) -> [(&'static str, &str); 4] {
        [
            ("jellyfin", self.jellyfin.url.as_str()),
            ("sonarr", self.sonarr.url.as_str()),
            ("radarr", self.radarr.url.as_str()),
            ("jellyseerr", self.jellyseerr.url.as_str()),
        ]
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
