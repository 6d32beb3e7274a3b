//! Outbound HTTP client used to reach origin servers.

use reqwest::header::{ACCEPT, RANGE, USER_AGENT};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::RelayError;

/// Fetches upstream resources with the configured identity, timeout and retry policy.
///
/// The timeout bounds the wait for response headers only. Segment bodies are
/// streamed for as long as the client keeps reading.
pub struct UpstreamClient {
    client: Client,
    user_agent: String,
    timeout: Duration,
    retries: u32,
    retry_backoff: Duration,
    forward_range: bool,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build upstream client with connect timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retries: config.retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            forward_range: config.forward_range,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`, retrying transport failures.
    ///
    /// Any HTTP response, including error statuses, is returned as-is for the
    /// caller to classify.
    pub async fn fetch(&self, url: &Url, range: Option<&str>) -> Result<Response, RelayError> {
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .header(USER_AGENT, &self.user_agent)
                .header(ACCEPT, "*/*");
            if let Some(range) = range.filter(|_| self.forward_range) {
                request = request.header(RANGE, range);
            }

            let error = match tokio::time::timeout(self.timeout, request.send()).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) if e.is_builder() || e.is_redirect() => {
                    return Err(RelayError::Transport(e))
                }
                Ok(Err(e)) => RelayError::Transport(e),
                Err(_) => RelayError::Timeout(self.timeout.as_secs()),
            };

            if attempt >= self.retries {
                return Err(error);
            }
            attempt += 1;

            tracing::debug!(
                url = %url,
                attempt,
                error = %error,
                "Retrying upstream fetch"
            );
            tokio::time::sleep(self.retry_backoff * attempt).await;
        }
    }
}
