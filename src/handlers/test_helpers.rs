//! Shared test utilities for handler tests.
//!
//! Provides a [`TestHarness`] that sets up a temporary `ListManager` backed by
//! fresh RocksDB stores in a temp directory, plus convenience helpers for
//! building session-authenticated HTTP requests and reading JSON responses.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot()

use super::router::build_router;
use super::state::ListManager;
use crate::auth::SESSION_HEADER;
use crate::config::ServerConfig;

/// A self-contained test environment with its own temp storage.
///
/// Holds `TempDir` so the directory isn't cleaned up until the harness drops.
pub struct TestHarness {
    pub manager: Arc<ListManager>,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with a fresh temp directory and default config.
    /// SMTP stays unconfigured, so email delivery is skipped in tests.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = ServerConfig {
            storage_path: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let manager = ListManager::new(temp_dir.path().to_path_buf(), config)
            .expect("failed to create test ListManager");

        Self {
            manager: Arc::new(manager),
            _temp_dir: temp_dir,
        }
    }

    /// Get a clone of the shared state (what handlers receive via `State(..)`).
    pub fn state(&self) -> Arc<ListManager> {
        self.manager.clone()
    }

    /// Build the full application router (public + protected routes).
    pub fn router(&self) -> Router {
        build_router(self.manager.clone())
    }

    /// Register a user directly through the manager and return their session
    /// token. For tests that need an authenticated user without walking the
    /// HTTP registration flow.
    pub fn register_user(&self, email: &str, name: &str) -> String {
        let (_user, session) = self
            .manager
            .register(email, "password123", Some(name.to_string()))
            .expect("failed to register test user");
        session.token
    }
}

// ---------- Request builders ----------

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        b = b.header(SESSION_HEADER, token);
    }
    b
}

/// Build a GET request to `uri`, optionally authenticated with a session token.
pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    builder(Method::GET, uri, token).body(Body::empty()).unwrap()
}

/// Build a POST request to `uri` with a JSON body.
pub fn post_json<T: serde::Serialize>(uri: &str, token: Option<&str>, body: &T) -> Request<Body> {
    let json = serde_json::to_string(body).unwrap();
    builder(Method::POST, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(json))
        .unwrap()
}

/// Build a POST request to `uri` with an empty body.
pub fn post_empty(uri: &str, token: Option<&str>) -> Request<Body> {
    builder(Method::POST, uri, token)
        .body(Body::empty())
        .unwrap()
}

/// Build a PUT request to `uri` with a JSON body.
pub fn put_json<T: serde::Serialize>(uri: &str, token: Option<&str>, body: &T) -> Request<Body> {
    let json = serde_json::to_string(body).unwrap();
    builder(Method::PUT, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(json))
        .unwrap()
}

/// Build a DELETE request to `uri`.
pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    builder(Method::DELETE, uri, token)
        .body(Body::empty())
        .unwrap()
}

// ---------- Response helpers ----------

/// Send a request through the router and return (status, JSON body).
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&body_bytes).to_string())
        })
    };
    (status, json)
}

/// Send a request and deserialize the body into `T`.
pub async fn send_typed<T: DeserializeOwned>(app: Router, req: Request<Body>) -> (StatusCode, T) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value: T = serde_json::from_slice(&body_bytes).unwrap_or_else(|e| {
        panic!(
            "failed to deserialize response: {e}\nbody: {}",
            String::from_utf8_lossy(&body_bytes)
        )
    });
    (status, value)
}
