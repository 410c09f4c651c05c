//! Shared setup for listings-frontend integration tests.
//!
//! Each test gets its own router wired to a fresh wiremock server standing in
//! for the upstream listings API.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use listings_frontend::config::{SessionSettings, UpstreamSettings};
use listings_frontend::services::upstream_client::UpstreamClient;
use listings_frontend::startup::build_router;
use listings_frontend::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub struct TestApp {
    pub upstream: MockServer,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_timeout(500).await
    }

    pub async fn spawn_with_timeout(timeout_ms: u64) -> Self {
        let upstream = MockServer::start().await;

        let settings = UpstreamSettings {
            url: upstream.uri(),
            timeout_ms,
            read_retries: 1,
            retry_backoff_ms: 10,
        };
        let client = UpstreamClient::new(&settings).expect("Failed to build upstream client");
        let state = AppState::new(Arc::new(client), SessionSettings::default());

        Self {
            upstream,
            router: build_router(state, "static"),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond")
    }

    pub async fn upstream_paths(&self) -> Vec<String> {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

/// An unsigned JWT carrying `claims`; the front end never checks signatures.
pub fn token_for(claims: Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"access"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

pub fn session_cookie(token: &str, uid: &str) -> String {
    format!("accessToken={}; uid={}", token, uid)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
