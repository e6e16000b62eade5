//! Outbound requests to origin servers.
//!
//! Every request carries the configured browser `User-Agent` and the
//! caller-supplied `Referer`, since origins that gate HLS on these headers
//! are the reason this proxy exists. Failures are returned as-is; nothing
//! here retries.

use crate::config::Config;
use crate::error::{ProxyError, Result};
use axum::body::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::header::{CONTENT_TYPE, HeaderValue, REFERER};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

const UTF8_BOM: char = '\u{feff}';

/// HTTP client for origin fetches, built from explicit configuration
#[derive(Debug, Clone)]
pub struct UpstreamFetcher {
    client: Client,
    manifest_timeout: Option<Duration>,
    max_manifest_bytes: usize,
}

/// Upstream response whose body has not been read yet
#[derive(Debug)]
pub struct UpstreamStream {
    url: String,
    content_type: Option<HeaderValue>,
    response: Response,
}

impl UpstreamStream {
    /// `Content-Type` declared by the origin, if any
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    /// Body as a pull-based byte stream.
    ///
    /// Chunks are only read from the origin when the consumer polls, and
    /// dropping the stream closes the upstream connection.
    pub fn into_body_stream(
        self,
    ) -> impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static {
        let url = self.url;
        self.response
            .bytes_stream()
            .inspect_err(move |e| warn!("Upstream body from {} ended early: {}", url, e))
    }
}

impl UpstreamFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.upstream_connect_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10);

        // Per-read deadline; segment streams have no total one.
        if let Some(idle) = config.upstream_read_timeout() {
            builder = builder.read_timeout(idle);
        }

        let client = builder.build().map_err(ProxyError::HttpClient)?;

        Ok(Self {
            client,
            manifest_timeout: config.manifest_timeout(),
            max_manifest_bytes: config.max_manifest_bytes,
        })
    }

    /// Fetch a playlist and buffer it as text.
    ///
    /// # Errors
    /// [`ProxyError::UpstreamFetch`] on connection failure, timeout or a
    /// non-2xx status; [`ProxyError::ManifestTooLarge`] when the body
    /// exceeds the configured cap.
    pub async fn fetch_text(&self, url: &str, referrer: Option<&str>) -> Result<String> {
        let mut response = self.get(url, referrer, self.manifest_timeout).await?;

        let too_large = || ProxyError::ManifestTooLarge {
            url: url.to_string(),
            limit: self.max_manifest_bytes,
        };

        if let Some(declared) = response.content_length()
            && declared > self.max_manifest_bytes as u64
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|source| ProxyError::UpstreamFetch {
            url: url.to_string(),
            source,
        })? {
            if body.len() + chunk.len() > self.max_manifest_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} byte playlist from {}", body.len(), url);

        let decoded = String::from_utf8_lossy(&body);
        let text: &str = &decoded;
        Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
    }

    /// Start fetching a segment without reading its body.
    ///
    /// # Errors
    /// [`ProxyError::UpstreamFetch`] on connection failure or a non-2xx
    /// status. Failures after the headers arrive surface on the stream.
    pub async fn fetch_stream(&self, url: &str, referrer: Option<&str>) -> Result<UpstreamStream> {
        let response = self.get(url, referrer, None).await?;
        let content_type = response.headers().get(CONTENT_TYPE).cloned();

        Ok(UpstreamStream {
            url: url.to_string(),
            content_type,
            response,
        })
    }

    async fn get(
        &self,
        url: &str,
        referrer: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let fetch_error = |source: reqwest::Error| ProxyError::UpstreamFetch {
            url: url.to_string(),
            source,
        };

        let mut request = self
            .client
            .get(url)
            .header(REFERER, referrer.unwrap_or_default());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(fetch_error)?;

        if !response.status().is_success() {
            warn!("Upstream returned {} for {}", response.status(), url);
        }

        response.error_for_status().map_err(fetch_error)
    }
}
