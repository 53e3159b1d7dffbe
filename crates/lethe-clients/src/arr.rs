//! Sonarr / Radarr catalog store
//!
//! Both applications share the v3 API shape; they differ in resource name,
//! provider id parameter, and the name of the import exclusion flag.

use crate::http::HttpClient;
use crate::{parse_external_id, ClientError};
use lethe_domain::traits::{CatalogRecord, CatalogStore, DeleteOptions};
use lethe_domain::MediaKind;
use serde::Deserialize;
use std::time::Duration;

/// Which *arr application a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrFlavor {
    /// Series store, keyed by TVDB id
    Sonarr,

    /// Movie store, keyed by TMDB id
    Radarr,
}

impl ArrFlavor {
    /// Flavor owning items of the given kind
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Series => ArrFlavor::Sonarr,
            MediaKind::Movie => ArrFlavor::Radarr,
        }
    }

    /// Application name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            ArrFlavor::Sonarr => "Sonarr",
            ArrFlavor::Radarr => "Radarr",
        }
    }

    fn resource(&self) -> &'static str {
        match self {
            ArrFlavor::Sonarr => "series",
            ArrFlavor::Radarr => "movie",
        }
    }

    fn id_param(&self) -> &'static str {
        match self {
            ArrFlavor::Sonarr => "tvdbId",
            ArrFlavor::Radarr => "tmdbId",
        }
    }

    fn exclusion_param(&self) -> &'static str {
        match self {
            ArrFlavor::Sonarr => "addImportListExclusion",
            ArrFlavor::Radarr => "addImportExclusion",
        }
    }
}

/// Record as returned by `/api/v3/series` and `/api/v3/movie`
#[derive(Debug, Deserialize)]
struct ArrRecord {
    id: i64,
    title: String,
}

/// Catalog store client for Sonarr or Radarr
pub struct ArrClient {
    http: HttpClient,
    flavor: ArrFlavor,
}

impl ArrClient {
    /// Create a client for the given application
    ///
    /// # Errors
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn new(
        flavor: ArrFlavor,
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::new(base_url, "X-Api-Key", api_key, timeout)?,
            flavor,
        })
    }

    /// Which application this client talks to
    pub fn flavor(&self) -> ArrFlavor {
        self.flavor
    }

    fn collection_path(&self) -> String {
        format!("/api/v3/{}", self.flavor.resource())
    }

    fn delete_query(&self, options: DeleteOptions) -> Vec<(&'static str, String)> {
        vec![
            ("deleteFiles", options.delete_files.to_string()),
            (self.flavor.exclusion_param(), options.add_exclusion.to_string()),
        ]
    }
}

impl CatalogStore for ArrClient {
    type Error = ClientError;

    fn lookup_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CatalogRecord>, Self::Error> {
        let provider_id = parse_external_id(external_id)?;

        let records: Vec<ArrRecord> = self.http.get(
            &self.collection_path(),
            &[(self.flavor.id_param(), provider_id.to_string())],
        )?;

        Ok(records.into_iter().next().map(|record| CatalogRecord {
            id: record.id,
            title: record.title,
        }))
    }

    fn delete(&mut self, record_id: i64, options: DeleteOptions) -> Result<(), Self::Error> {
        let path = format!("{}/{}", self.collection_path(), record_id);
        tracing::debug!(
            "{}: DELETE {} (deleteFiles={}, exclusion={})",
            self.flavor.name(),
            path,
            options.delete_files,
            options.add_exclusion
        );
        self.http.delete(&path, &self.delete_query(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(flavor: ArrFlavor) -> ArrClient {
        ArrClient::new(flavor, "http://localhost:8989/", "key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_flavor_for_kind() {
        assert_eq!(ArrFlavor::for_kind(MediaKind::Series), ArrFlavor::Sonarr);
        assert_eq!(ArrFlavor::for_kind(MediaKind::Movie), ArrFlavor::Radarr);
    }

    #[test]
    fn test_sonarr_delete_query() {
        let sonarr = client(ArrFlavor::Sonarr);
        assert_eq!(sonarr.collection_path(), "/api/v3/series");
        assert_eq!(
            sonarr.delete_query(DeleteOptions::purge()),
            vec![
                ("deleteFiles", "true".to_string()),
                ("addImportListExclusion", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_radarr_delete_query() {
        let radarr = client(ArrFlavor::Radarr);
        assert_eq!(radarr.collection_path(), "/api/v3/movie");
        assert_eq!(
            radarr.delete_query(DeleteOptions::purge()),
            vec![
                ("deleteFiles", "true".to_string()),
                ("addImportExclusion", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_lookup_rejects_non_numeric_id_without_network() {
        let radarr = client(ArrFlavor::Radarr);
        let result = radarr.lookup_by_external_id("");
        assert!(matches!(result, Err(ClientError::InvalidExternalId(_))));
    }

    #[test]
    fn test_record_parsing() {
        let json = r#"[{"id": 12, "title": "Heat", "tmdbId": 949, "path": "/movies/Heat (1995)"}]"#;
        let records: Vec<ArrRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 12);
        assert_eq!(records[0].title, "Heat");
    }
}
