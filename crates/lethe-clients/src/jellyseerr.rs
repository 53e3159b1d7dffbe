//! Jellyseerr request broker

use crate::http::HttpClient;
use crate::{parse_external_id, ClientError};
use lethe_domain::traits::{RequestBroker, RequestRemoval};
use lethe_domain::MediaKind;
use serde::Deserialize;
use std::time::Duration;

/// Requests fetched per page
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestPage {
    #[serde(default)]
    results: Vec<MediaRequest>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    pages: usize,
}

#[derive(Debug, Deserialize)]
struct MediaRequest {
    id: i64,
    #[serde(rename = "type")]
    media_type: String,
    media: Option<RequestedMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestedMedia {
    tmdb_id: Option<i64>,
    tvdb_id: Option<i64>,
}

impl MediaRequest {
    /// Whether this request is for the item with the given provider id
    ///
    /// Series are matched on TVDB id, movies on TMDB id.
    fn matches(&self, provider_id: i64, kind: MediaKind) -> bool {
        let Some(media) = &self.media else {
            return false;
        };
        match kind {
            MediaKind::Series => self.media_type == "tv" && media.tvdb_id == Some(provider_id),
            MediaKind::Movie => self.media_type == "movie" && media.tmdb_id == Some(provider_id),
        }
    }
}

/// Request broker client for Jellyseerr
pub struct JellyseerrClient {
    http: HttpClient,
}

impl JellyseerrClient {
    /// Create a client
    ///
    /// # Errors
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::new(base_url, "X-Api-Key", api_key, timeout)?,
        })
    }

    /// Fetch every request, following pagination
    fn all_requests(&self) -> Result<Vec<MediaRequest>, ClientError> {
        let mut requests = Vec::new();
        let mut page = 0;

        loop {
            let response: RequestPage = self.http.get(
                "/api/v1/request",
                &[
                    ("take", PAGE_SIZE.to_string()),
                    ("skip", (page * PAGE_SIZE).to_string()),
                    ("filter", "all".to_string()),
                    ("sort", "added".to_string()),
                ],
            )?;

            requests.extend(response.results);
            page += 1;
            if page >= response.page_info.pages {
                break;
            }
        }

        Ok(requests)
    }
}

impl RequestBroker for JellyseerrClient {
    type Error = ClientError;

    fn delete_request(
        &mut self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<RequestRemoval, Self::Error> {
        let provider_id = parse_external_id(external_id)?;

        let matching: Vec<i64> = self
            .all_requests()?
            .into_iter()
            .filter(|request| request.matches(provider_id, kind))
            .map(|request| request.id)
            .collect();

        if matching.is_empty() {
            return Ok(RequestRemoval::NotFound);
        }

        for request_id in &matching {
            self.http
                .delete(&format!("/api/v1/request/{}", request_id), &[])?;
        }

        Ok(RequestRemoval::Removed(matching.len()))
    }
}
