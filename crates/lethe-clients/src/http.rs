//! Shared blocking HTTP plumbing for the backend clients

use crate::ClientError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for a single backend request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Base URL, credentials and a blocking client, shared by every request of
/// one backend
pub(crate) struct HttpClient {
    base_url: String,
    auth_header: &'static str,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub(crate) fn new(
        base_url: &str,
        auth_header: &'static str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            api_key: api_key.into(),
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON body
    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .header(self.auth_header, &self.api_key)
            .query(query)
            .send()?;

        Self::decode(Self::check(response)?)
    }

    /// POST a JSON body to `path` and decode the JSON answer
    pub(crate) fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .header(self.auth_header, &self.api_key)
            .query(query)
            .json(body)
            .send()?;

        Self::decode(Self::check(response)?)
    }

    /// POST to `path`, ignoring whatever the backend answers on success
    pub(crate) fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(), ClientError> {
        let mut request = self
            .client
            .post(self.url(path))
            .header(self.auth_header, &self.api_key)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        Self::check(request.send()?)?;
        Ok(())
    }

    /// DELETE `path`
    pub(crate) fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(path))
            .header(self.auth_header, &self.api_key)
            .query(query)
            .send()?;

        Self::check(response)?;
        Ok(())
    }

    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, ClientError> {
        response
            .json::<T>()
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = HttpClient::new(
            "http://localhost:8096//",
            "X-Api-Key",
            "key",
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8096");
        assert_eq!(client.url("/Users"), "http://localhost:8096/Users");
    }

    #[test]
    fn test_unreachable_backend_is_http_error() {
        let client = HttpClient::new(
            "http://127.0.0.1:1",
            "X-Api-Key",
            "key",
            Duration::from_secs(2),
        )
        .unwrap();

        let result: Result<serde_json::Value, _> = client.get("/api/v3/series", &[]);
        match result {
            Err(ClientError::Http(_)) => {} // Expected
            other => panic!("Expected Http error, got {:?}", other),
        }
    }
}
