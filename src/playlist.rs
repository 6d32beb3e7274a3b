//! HLS playlist classification and rewriting.
//!
//! Everything here is pure: no I/O and no request state. The relay handler
//! fetches a playlist, calls [`rewrite`] once, and returns the result. Nested
//! playlists are rewritten when the player requests them through the relay,
//! never by recursing here.
//!
//! # Line grammar
//!
//! Following RFC 8216 a playlist line is one of:
//! - a directive or comment, starting with `#`
//! - a blank line
//! - a URI line, anything else
//!
//! Directives and blank lines are copied byte for byte. URI lines are replaced
//! by a relay link carrying the fully resolved upstream URL.

use std::borrow::Cow;
use url::Url;

/// Content type served for every rewritten playlist.
pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Path under which the relay serves `?url=` requests.
pub const RELAY_ROUTE: &str = "/api/stream";

/// Content types origins use for HLS playlists.
const MANIFEST_CONTENT_TYPES: &[&str] = &[
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
];

/// Tags whose `URI="..."` attribute points at a fetchable resource.
const URI_ATTRIBUTE_TAGS: &[&str] = &[
    "#EXT-X-KEY:",
    "#EXT-X-SESSION-KEY:",
    "#EXT-X-MAP:",
    "#EXT-X-MEDIA:",
    "#EXT-X-I-FRAME-STREAM-INF:",
    "#EXT-X-PRELOAD-HINT:",
    "#EXT-X-RENDITION-REPORT:",
];

/// Classification of a single playlist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Directive,
    Blank,
    Uri,
}

/// Classify one line (without its terminator).
pub fn classify(line: &str) -> LineKind {
    if line.starts_with('#') {
        LineKind::Directive
    } else if line.trim().is_empty() {
        LineKind::Blank
    } else {
        LineKind::Uri
    }
}

/// Check whether a `Content-Type` header value denotes an HLS playlist.
///
/// Parameters such as `; charset=utf-8` are ignored, matching is case-insensitive.
pub fn is_manifest_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    MANIFEST_CONTENT_TYPES.contains(&essence.as_str())
}

/// Decide whether an upstream resource is a playlist.
///
/// The declared content type wins; otherwise the URL path (never the query or
/// fragment) must end in `.m3u8`.
pub fn is_manifest(content_type: Option<&str>, url: &Url) -> bool {
    if content_type.is_some_and(is_manifest_content_type) {
        return true;
    }

    url.path().to_ascii_lowercase().ends_with(".m3u8")
}

/// Directory of a playlist URL: the path truncated after its last `/`.
///
/// Query and fragment are dropped. Only the trailing filename is removed, so
/// `/live/chan1/chan1.m3u8` yields `/live/chan1/`.
pub fn base_url(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);

    let path = url.path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    base.set_path(dir);
    base
}

/// Build the relay link that fetches `target` through the relay.
pub fn relay_link(relay_prefix: &str, target: &str) -> String {
    format!(
        "{}{}?url={}",
        relay_prefix.trim_end_matches('/'),
        RELAY_ROUTE,
        urlencoding::encode(target)
    )
}

/// Options for [`rewrite`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions<'a> {
    /// Prefix for relay links; empty keeps them root-relative.
    pub relay_prefix: &'a str,
    /// Rewrite `URI="..."` attributes on key, map and rendition tags.
    pub attribute_uris: bool,
}

/// Rewrite every URI line of `manifest` into a relay link.
///
/// `base` is the playlist's directory (see [`base_url`]). The output has the
/// same number of lines, in the same order, with the same terminators.
pub fn rewrite(manifest: &str, base: &Url, options: &RewriteOptions<'_>) -> String {
    let mut out = String::with_capacity(manifest.len() + manifest.len() / 2);

    for (idx, raw) in manifest.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }

        let (line, cr) = match raw.strip_suffix('\r') {
            Some(line) => (line, "\r"),
            None => (raw, ""),
        };

        let rewritten = match classify(line) {
            LineKind::Uri => rewrite_uri_line(line, base, options.relay_prefix),
            LineKind::Directive if options.attribute_uris => {
                rewrite_uri_attribute(line, base, options.relay_prefix)
            }
            _ => Cow::Borrowed(line),
        };

        out.push_str(&rewritten);
        out.push_str(cr);
    }

    out
}

/// Resolve a URI reference found in a playlist to the absolute URL it names.
///
/// Returns `None` for references the relay cannot fetch (non-http schemes,
/// unresolvable input).
pub fn resolve_reference(reference: &str, base: &Url) -> Option<String> {
    match Url::parse(reference) {
        // Already absolute: keep the original text so the link decodes back to it exactly.
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(reference.to_string()),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(reference).ok().map(String::from)
        }
        Err(_) => None,
    }
}

fn rewrite_uri_line<'a>(line: &'a str, base: &Url, relay_prefix: &str) -> Cow<'a, str> {
    match resolve_reference(line.trim(), base) {
        Some(target) => Cow::Owned(relay_link(relay_prefix, &target)),
        None => {
            tracing::debug!(line, "Leaving unresolvable playlist line untouched");
            Cow::Borrowed(line)
        }
    }
}

fn rewrite_uri_attribute<'a>(line: &'a str, base: &Url, relay_prefix: &str) -> Cow<'a, str> {
    if !URI_ATTRIBUTE_TAGS.iter().any(|tag| line.starts_with(tag)) {
        return Cow::Borrowed(line);
    }

    const MARKER: &str = "URI=\"";
    let Some(start) = line.find(MARKER).map(|i| i + MARKER.len()) else {
        return Cow::Borrowed(line);
    };
    let Some(len) = line[start..].find('"') else {
        return Cow::Borrowed(line);
    };
    let end = start + len;

    match resolve_reference(&line[start..end], base) {
        Some(target) => Cow::Owned(format!(
            "{}{}{}",
            &line[..start],
            relay_link(relay_prefix, &target),
            &line[end..]
        )),
        None => Cow::Borrowed(line),
    }
}
