//! Relay handlers.
//!
//! Both endpoints share one pipeline: resolve the upstream URL, fetch it,
//! rewrite it if it is a playlist, otherwise stream it through untouched.
//! They differ only in how the upstream URL is obtained.

use axum::{
    body::Body,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{RelayError, RelayRoute};
use crate::playlist::{self, RewriteOptions, MANIFEST_CONTENT_TYPE};
use crate::server::AppContext;
use crate::streaming::catalog::{self, CatalogError};

/// Upstream headers copied onto passthrough responses.
const PASSTHROUGH_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-encoding",
    "content-range",
    "accept-ranges",
    "cache-control",
    "etag",
    "last-modified",
];

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    url: Option<String>,
}

/// `GET /api/stream?url={encodedURL}`
pub async fn relay_by_url(
    State(ctx): State<AppContext>,
    query: Result<Query<StreamQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let Query(query) = query.map_err(|rejection| RelayError::InvalidUrl(rejection.body_text()))?;
    let raw = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(RelayError::MissingUrl)?;

    let target =
        catalog::parse_stream_url(raw).map_err(|_| RelayError::InvalidUrl(raw.to_string()))?;

    relay(&ctx, target, RelayRoute::Url, &headers).await
}

/// `GET /api/stream/{channelId}`
pub async fn relay_by_channel(
    State(ctx): State<AppContext>,
    channel_id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let Path(channel_id) = channel_id
        .map_err(|rejection| CatalogError::InvalidUrl(rejection.body_text()))?;
    let target = ctx.catalog.resolve(&channel_id).await?;
    tracing::debug!(channel = %channel_id, url = %target, "Resolved channel");

    relay(&ctx, target, RelayRoute::Channel, &headers).await
}

async fn relay(
    ctx: &AppContext,
    target: Url,
    route: RelayRoute,
    headers: &HeaderMap,
) -> Result<Response, RelayError> {
    tracing::debug!(url = %target, "Relaying stream");

    // A partial playlist cannot be rewritten, so ranges only go to media.
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .filter(|_| !playlist::is_manifest(None, &target));

    let mut upstream = ctx.upstream.fetch(&target, range).await?;

    // The target only revealed itself as a playlist by content type; fetch it whole.
    if range.is_some() && is_manifest_response(&upstream, &target) {
        tracing::debug!(url = %target, "Range request hit a playlist, refetching without range");
        upstream = ctx.upstream.fetch(&target, None).await?;
    }

    let status = upstream.status();
    if !status.is_success() {
        return Err(RelayError::UpstreamRejected {
            status: status.as_u16(),
            route,
        });
    }

    if is_manifest_response(&upstream, &target) {
        if status == reqwest::StatusCode::PARTIAL_CONTENT {
            return Err(RelayError::PartialManifest);
        }
        // Redirects move the playlist, and relative children follow it.
        let final_url = upstream.url().clone();
        serve_manifest(ctx, upstream, &final_url).await
    } else {
        Ok(stream_passthrough(upstream))
    }
}

/// Playlist by content type or path, on either the requested or the final URL.
fn is_manifest_response(upstream: &reqwest::Response, target: &Url) -> bool {
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    playlist::is_manifest(content_type, upstream.url()) || playlist::is_manifest(None, target)
}

async fn serve_manifest(
    ctx: &AppContext,
    upstream: reqwest::Response,
    playlist_url: &Url,
) -> Result<Response, RelayError> {
    let text = read_manifest(
        upstream,
        ctx.config.relay.max_manifest_bytes,
        ctx.upstream.timeout(),
    )
    .await?;

    let base = playlist::base_url(playlist_url);
    let options = RewriteOptions {
        relay_prefix: &ctx.config.relay.public_base_url,
        attribute_uris: ctx.config.relay.rewrite_attribute_uris,
    };
    let rewritten = playlist::rewrite(&text, &base, &options);

    tracing::trace!(url = %playlist_url, bytes = rewritten.len(), "Rewrote playlist");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        rewritten,
    )
        .into_response())
}

/// Buffer a playlist body, bounded in size and time.
async fn read_manifest(
    upstream: reqwest::Response,
    limit: usize,
    timeout: Duration,
) -> Result<String, RelayError> {
    if upstream.content_length().is_some_and(|len| len > limit as u64) {
        return Err(RelayError::ManifestTooLarge { limit });
    }

    let read = async move {
        let mut stream = upstream.bytes_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > limit {
                return Err(RelayError::ManifestTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok::<_, RelayError>(buf)
    };

    let buf = tokio::time::timeout(timeout, read)
        .await
        .map_err(|_| RelayError::Timeout(timeout.as_secs()))??;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Stream a media resource without buffering it.
///
/// Dropping the returned body (client disconnect) drops the upstream stream,
/// which aborts the origin fetch.
fn stream_passthrough(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::OK);

    let mut passthrough = Vec::with_capacity(PASSTHROUGH_HEADERS.len());
    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = upstream
            .headers()
            .get(*name)
            .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        {
            passthrough.push((HeaderName::from_static(*name), value));
        }
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    response.headers_mut().extend(passthrough);
    response
}
