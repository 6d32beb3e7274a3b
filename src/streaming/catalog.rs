//! Channel catalog: turns a channel identifier into a playable upstream URL.

use futures::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::CatalogConfig;

/// Timeout for remote catalog lookups
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A lookup answer is a single URL.
const MAX_LOOKUP_BYTES: usize = 8 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel resolved to an invalid url: {0}")]
    InvalidUrl(String),

    #[error("catalog lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    #[error("catalog answer exceeds {0} bytes")]
    ResponseTooLarge(usize),
}

/// Resolves opaque channel identifiers to upstream URLs
#[async_trait::async_trait]
pub trait ChannelCatalog: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Url, CatalogError>;
}

/// Create the catalog described by config. Remote lookups identify as `user_agent`.
pub fn create_catalog(config: &CatalogConfig, user_agent: &str) -> Arc<dyn ChannelCatalog> {
    match config {
        CatalogConfig::Passthrough => Arc::new(PassthroughCatalog),
        CatalogConfig::Static { channels } => Arc::new(StaticCatalog::new(channels.clone())),
        CatalogConfig::Remote { url_template } => {
            Arc::new(RemoteCatalog::new(url_template, user_agent))
        }
    }
}

/// Parse an absolute http(s) URL.
pub fn parse_stream_url(raw: &str) -> Result<Url, CatalogError> {
    let url = Url::parse(raw.trim()).map_err(|_| CatalogError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(CatalogError::InvalidUrl(raw.to_string())),
    }
}

/// Treats the identifier itself as the upstream URL.
pub struct PassthroughCatalog;

#[async_trait::async_trait]
impl ChannelCatalog for PassthroughCatalog {
    async fn resolve(&self, identifier: &str) -> Result<Url, CatalogError> {
        parse_stream_url(identifier)
    }
}

/// Fixed identifier-to-URL table loaded from config.
pub struct StaticCatalog {
    channels: BTreeMap<String, String>,
}

impl StaticCatalog {
    pub fn new(channels: BTreeMap<String, String>) -> Self {
        Self { channels }
    }
}

#[async_trait::async_trait]
impl ChannelCatalog for StaticCatalog {
    async fn resolve(&self, identifier: &str) -> Result<Url, CatalogError> {
        let target = self
            .channels
            .get(identifier)
            .ok_or_else(|| CatalogError::UnknownChannel(identifier.to_string()))?;
        parse_stream_url(target)
    }
}

/// Asks an external catalog service over HTTP. The response body is the URL.
pub struct RemoteCatalog {
    client: Client,
    url_template: String,
    user_agent: String,
}

impl RemoteCatalog {
    pub fn new(url_template: &str, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build catalog client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            url_template: url_template.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    fn lookup_url(&self, identifier: &str) -> String {
        self.url_template
            .replace("{id}", &urlencoding::encode(identifier))
    }
}

#[async_trait::async_trait]
impl ChannelCatalog for RemoteCatalog {
    async fn resolve(&self, identifier: &str) -> Result<Url, CatalogError> {
        let response = self
            .client
            .get(self.lookup_url(identifier))
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(
                channel = identifier,
                status = response.status().as_u16(),
                "Catalog has no entry for channel"
            );
            return Err(CatalogError::UnknownChannel(identifier.to_string()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_LOOKUP_BYTES as u64)
        {
            return Err(CatalogError::ResponseTooLarge(MAX_LOOKUP_BYTES));
        }

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > MAX_LOOKUP_BYTES {
                return Err(CatalogError::ResponseTooLarge(MAX_LOOKUP_BYTES));
            }
            body.extend_from_slice(&chunk);
        }

        parse_stream_url(&String::from_utf8_lossy(&body))
    }
}
