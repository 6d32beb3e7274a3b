use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Outbound fetch settings applied to every request sent to an origin.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// User-Agent sent upstream. Some origins reject browser or library
    /// identities, so the default impersonates curl.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds to wait for response headers (and for a full manifest body)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Extra attempts after a transport failure. HTTP error statuses are never retried.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Forward the client's Range header to the origin
    #[serde(default = "default_forward_range")]
    pub forward_range: bool,
}

fn default_user_agent() -> String {
    "curl/8.5.0".to_string()
}
fn default_timeout() -> u64 {
    15
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_retries() -> u32 {
    1
}
fn default_retry_backoff() -> u64 {
    250
}
fn default_forward_range() -> bool {
    true
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff(),
            forward_range: default_forward_range(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Absolute origin prepended to rewritten links, e.g. `https://relay.example.com`.
    /// Empty means rewritten links stay root-relative.
    #[serde(default)]
    pub public_base_url: String,

    /// Upper bound on a buffered playlist body
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: usize,

    /// Also rewrite `URI="..."` attributes on key, map and rendition tags
    #[serde(default)]
    pub rewrite_attribute_uris: bool,
}

fn default_max_manifest_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            max_manifest_bytes: default_max_manifest_bytes(),
            rewrite_attribute_uris: false,
        }
    }
}

/// How `/api/stream/{channelId}` turns an identifier into an upstream URL.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// The identifier is itself the upstream URL
    #[default]
    Passthrough,

    /// Fixed identifier-to-URL table
    Static {
        #[serde(default)]
        channels: BTreeMap<String, String>,
    },

    /// HTTP lookup; `{id}` in the template is replaced by the encoded identifier
    /// and the response body is the playable URL.
    Remote { url_template: String },
}

impl CatalogConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogConfig::Passthrough => "passthrough",
            CatalogConfig::Static { .. } => "static",
            CatalogConfig::Remote { .. } => "remote",
        }
    }
}
