//! Command implementations.

pub mod check_config;
pub mod daemon;
pub mod run;
pub mod staged;

pub use self::check_config::execute_check_config;
pub use self::daemon::execute_daemon;
pub use self::run::execute_run;
pub use self::staged::execute_staged;

use crate::config::{ApiKeys, AppConfig};
use crate::error::Result;
use lethe_clients::{ArrClient, ArrFlavor, JellyfinClient, JellyseerrClient};
use lethe_janitor::Backends;

/// Gateways backed by the live services.
pub type LiveBackends = Backends<JellyfinClient, ArrClient, ArrClient, JellyseerrClient>;

/// Build one client per configured service.
///
/// The clients are blocking; build them outside any async runtime.
pub fn connect(config: &AppConfig, keys: &ApiKeys) -> Result<LiveBackends> {
    let timeout = config.timeout();

    Ok(Backends {
        library: library(config, keys)?,
        series: ArrClient::new(ArrFlavor::Sonarr, &config.sonarr.url, keys.sonarr.clone(), timeout)?,
        movies: ArrClient::new(ArrFlavor::Radarr, &config.radarr.url, keys.radarr.clone(), timeout)?,
        requests: JellyseerrClient::new(&config.jellyseerr.url, keys.jellyseerr.clone(), timeout)?,
    })
}

/// Build the library index client alone.
pub fn library(config: &AppConfig, keys: &ApiKeys) -> Result<JellyfinClient> {
    let client = JellyfinClient::new(&config.jellyfin.url, keys.jellyfin.clone(), config.timeout())?;
    Ok(match &config.jellyfin.user_id {
        Some(user_id) => client.with_user(user_id.clone()),
        None => client,
    })
}
