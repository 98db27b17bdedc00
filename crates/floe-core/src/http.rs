//! HTTP storage backend for fetching catalogue payloads.
//!
//! Payloads are served as static objects under a base URL; a datastore fetch
//! is a plain `GET {base_url}/{path}`. Non-2xx responses map to typed errors
//! so callers can distinguish a missing payload from a transport failure.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::storage::StorageBackend;

/// Storage backend reading payloads over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a new HTTP backend rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::fetch_with_source("failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a backend from the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.catalog_url.clone(), config.request_timeout())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl StorageBackend for HttpBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let url = self.url_for(path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch_with_source(format!("request to {url} failed"), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::fetch(format!("GET {url} returned {status}: {body}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::fetch_with_source(format!("reading body from {url} failed"), e))
    }
}
