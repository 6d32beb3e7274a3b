//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds the relay router from a config. Requests
//! go through `tower::ServiceExt::oneshot`; [`TestHarness::with_server`] binds a
//! real port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hlsrelay::config::{Config, UpstreamConfig};
use hlsrelay::server::{create_router, AppContext};

pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Collected relay response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("body is not utf-8")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct TestHarness {
    pub app: Router,
}

impl TestHarness {
    /// Harness with default configuration but no retries, so failures are fast.
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: Config) -> Self {
        let app = create_router(AppContext::new(config));
        Self { app }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Start the relay on a random port and return the bound socket address.
    pub async fn with_server(config: Config) -> SocketAddr {
        let app = create_router(AppContext::new(config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }
}

pub fn fast_config() -> Config {
    Config {
        upstream: UpstreamConfig {
            retries: 0,
            timeout_secs: 5,
            connect_timeout_secs: 1,
            ..UpstreamConfig::default()
        },
        ..Config::default()
    }
}

/// Relay path for an explicit upstream URL.
pub fn relay_path(upstream: &str) -> String {
    format!("/api/stream?url={}", urlencoding::encode(upstream))
}

/// Relay path for a channel identifier.
pub fn channel_path(identifier: &str) -> String {
    format!("/api/stream/{}", urlencoding::encode(identifier))
}
