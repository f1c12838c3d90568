//! Integration tests for the gallery backend.
//!
//! # Running Tests
//!
//! ```bash
//! # Everything that runs without a database
//! cargo test -p gallery-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_checkout` - Cart and checkout flows over the in-memory store
//! - `tokens` - Bearer token issuing and verification
//! - `http_api` - Router-level behavior that is decided before any query
//!
//! The HTTP tests build the real router over a lazily connected pool. The
//! pool never opens a connection, so only requests rejected by extractors,
//! middleware or the router itself can be exercised here.

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use gallery_core::{Role, UserId};
use gallery_server::config::{AuthConfig, GalleryConfig};
use gallery_server::routes;
use gallery_server::state::AppState;

/// Signing secret used by every test server.
pub const TEST_SECRET: &str = "k8#Jd02!mZq7@Lp4$Xv9&Rt1^Wn6*Cb3";

/// Largest response body the helpers will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for a server that is never bound to a port.
#[must_use]
pub fn test_config() -> GalleryConfig {
    GalleryConfig {
        database_url: SecretString::from("postgres://gallery@localhost:1/gallery_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cors_origin: "http://localhost:3000".to_string(),
        upload_dir: std::env::temp_dir().join("gallery-integration-uploads"),
        auth: AuthConfig {
            jwt_secret: SecretString::from(TEST_SECRET),
            token_ttl_hours: 1,
        },
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state over a pool that connects on first use.
///
/// Must be called inside a Tokio runtime.
///
/// # Panics
///
/// Panics if the test database URL cannot be parsed.
#[must_use]
pub fn lazy_state() -> AppState {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://gallery@localhost:1/gallery_test")
        .expect("Failed to build lazy pool");
    AppState::new(config, pool)
}

/// The full router, as the binary serves it minus Sentry.
#[must_use]
pub fn test_app(state: AppState) -> Router {
    routes::app(state)
}

/// `Authorization` header value for a token signed by `state`.
///
/// # Panics
///
/// Panics if signing fails.
#[must_use]
pub fn bearer(state: &AppState, user_id: i32, role: Role) -> String {
    let token = state
        .tokens()
        .issue(UserId::new(user_id), role)
        .expect("Failed to sign token");
    format!("Bearer {token}")
}

/// A response reduced to what the tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive one request through `app`.
///
/// Non-JSON bodies come back as `Value::Null`.
///
/// # Panics
///
/// Panics if the router fails or the body cannot be read.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("Router failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES)
        .await
        .expect("Failed to read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}
