//! Error taxonomy for the relay request path.
//!
//! Every variant maps to a status code and a fixed plain-text body. Detail
//! (upstream addresses, transport errors) is logged server-side and never
//! written to the response.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::streaming::catalog::CatalogError;

/// Which relay endpoint produced an error. The endpoints report upstream
/// rejections with different bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayRoute {
    /// `GET /api/stream/{channelId}`
    Channel,
    /// `GET /api/stream?url=...`
    Url,
}

impl RelayRoute {
    fn rejection_body(self) -> &'static str {
        match self {
            RelayRoute::Channel => "Stream fetch failed",
            RelayRoute::Url => "Failed fetching stream",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The `url` query parameter is absent or empty.
    #[error("missing url parameter")]
    MissingUrl,

    /// The supplied URL does not parse or is not http(s).
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),

    /// The origin answered with a non-success status.
    #[error("upstream responded with {status}")]
    UpstreamRejected { status: u16, route: RelayRoute },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream did not respond within {0} seconds")]
    Timeout(u64),

    #[error("playlist exceeds {limit} bytes")]
    ManifestTooLarge { limit: usize },

    /// The origin answered a playlist fetch with a partial body.
    #[error("upstream returned a partial playlist")]
    PartialManifest,

    #[error("channel lookup failed: {0}")]
    Catalog(#[from] CatalogError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Transport(_)
            | RelayError::Timeout(_)
            | RelayError::ManifestTooLarge { .. }
            | RelayError::PartialManifest
            | RelayError::Catalog(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            RelayError::MissingUrl => "Missing URL",
            RelayError::InvalidUrl(_) => "Invalid URL",
            RelayError::UpstreamRejected { route, .. } => route.rejection_body(),
            RelayError::Transport(_)
            | RelayError::Timeout(_)
            | RelayError::ManifestTooLarge { .. }
            | RelayError::PartialManifest
            | RelayError::Catalog(_) => "Stream not found",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) => {
                tracing::debug!(error = %self, "Rejected relay request");
            }
            RelayError::UpstreamRejected { .. } => {
                tracing::info!(error = %self, "Upstream rejected relay fetch");
            }
            _ => {
                tracing::warn!(error = %self, "Stream relay failed");
            }
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}
