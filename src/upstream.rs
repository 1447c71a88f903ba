//! Upstream Client
//!
//! Thin reqwest wrapper over the third-party content API and media hosts.
//! Every request is bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::image::ImageFetcher;

// == Upstream Error ==
/// Failure talking to the content API or a media host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Transport failure: DNS, connect, timeout, reset
    #[error("request failed: {0}")]
    Request(String),

    /// Non-2xx response
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body was not the JSON we asked for
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

// == Upstream Client ==
/// HTTP client for the content API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    // == Constructor ==
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::from)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Fetch ==
    /// GET `{base}/{endpoint}` with query `params`, decoded as JSON.
    pub async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!("Upstream GET {} {:?}", url, params);

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }

    /// GET an absolute media URL and return the raw body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, UpstreamError> {
        debug!("Media GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}

// == Image Fetcher ==
#[async_trait]
impl ImageFetcher for UpstreamClient {
    async fn fetch(&self, url: &str) -> Result<Bytes, UpstreamError> {
        self.fetch_bytes(url).await
    }
}
