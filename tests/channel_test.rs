//! Integration tests for `GET /api/stream/{channelId}`.

mod common;

use axum::http::StatusCode;
use common::{channel_path, fast_config, TestHarness, MANIFEST_CONTENT_TYPE};
use hlsrelay::config::CatalogConfig;
use std::collections::BTreeMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYLIST: &str = "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\nchunk-1.ts\n";

async fn origin_with_playlist(at: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(PLAYLIST.as_bytes().to_vec(), MANIFEST_CONTENT_TYPE),
        )
        .mount(&server)
        .await;
    server
}

fn expected_playlist(server: &MockServer, dir: &str) -> String {
    format!(
        "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\n/api/stream?url={}\n",
        urlencoding::encode(&format!("{}{}chunk-1.ts", server.uri(), dir))
    )
}

#[tokio::test]
async fn passthrough_identifier_is_the_url() {
    let server = origin_with_playlist("/tv/one/index.m3u8").await;
    let h = TestHarness::new();

    let resp = h
        .get(&channel_path(&format!("{}/tv/one/index.m3u8", server.uri())))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("content-type"), Some(MANIFEST_CONTENT_TYPE));
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    assert_eq!(resp.text(), expected_playlist(&server, "/tv/one/"));
}

#[tokio::test]
async fn passthrough_rejects_non_url_identifier() {
    let h = TestHarness::new();
    let resp = h.get("/api/stream/channel-42").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.text(), "Stream not found");
}

#[tokio::test]
async fn undecodable_identifier_is_not_found() {
    let h = TestHarness::new();
    let resp = h.get("/api/stream/%FF%FE").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.text(), "Stream not found");
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn upstream_rejection_uses_channel_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv/gone.m3u8"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let h = TestHarness::new();
    let resp = h
        .get(&channel_path(&format!("{}/tv/gone.m3u8", server.uri())))
        .await;

    assert_eq!(resp.status, StatusCode::GONE);
    assert_eq!(resp.text(), "Stream fetch failed");
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn static_catalog_resolves_channel() {
    let server = origin_with_playlist("/news/hd/index.m3u8").await;

    let mut channels = BTreeMap::new();
    channels.insert(
        "news".to_string(),
        format!("{}/news/hd/index.m3u8", server.uri()),
    );
    let mut config = fast_config();
    config.catalog = CatalogConfig::Static { channels };
    let h = TestHarness::with_config(config);

    let resp = h.get("/api/stream/news").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), expected_playlist(&server, "/news/hd/"));

    let resp = h.get("/api/stream/sports").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.text(), "Stream not found");
}

#[tokio::test]
async fn remote_catalog_resolves_channel() {
    let server = origin_with_playlist("/origin/ch7/index.m3u8").await;
    Mock::given(method("GET"))
        .and(path("/catalog/ch7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("{}/origin/ch7/index.m3u8\n", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = fast_config();
    config.catalog = CatalogConfig::Remote {
        url_template: format!("{}/catalog/{{id}}", server.uri()),
    };
    let h = TestHarness::with_config(config);

    let resp = h.get("/api/stream/ch7").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), expected_playlist(&server, "/origin/ch7/"));

    let resp = h.get("/api/stream/missing").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.text(), "Stream not found");
}

#[tokio::test]
async fn channel_segments_stream_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv/seg.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8; 512], "video/mp2t"))
        .mount(&server)
        .await;

    let h = TestHarness::new();
    let resp = h
        .get(&channel_path(&format!("{}/tv/seg.ts", server.uri())))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header("content-type"), Some("video/mp2t"));
    assert_eq!(resp.body, vec![9u8; 512]);
}
