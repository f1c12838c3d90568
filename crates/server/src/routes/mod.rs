//! HTTP route handlers for the gallery API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (database)
//!
//! # Auth
//! POST   /api/auth/register            - Create account, returns token (rate limited)
//! POST   /api/auth/login               - Password login, returns token (rate limited)
//! GET    /api/auth/user                - Current user
//!
//! # Catalog
//! GET    /api/artworks                 - All artworks
//! GET    /api/artworks/featured        - Featured artworks
//! GET    /api/artworks/{id}            - One artwork
//! POST   /api/artworks                 - Create (admin, multipart)
//! PUT    /api/artworks/{id}            - Update (admin, multipart)
//! DELETE /api/artworks/{id}            - Delete (admin)
//! GET    /api/exhibitions              - All exhibitions
//! GET    /api/exhibitions/current      - Running now
//! GET    /api/exhibitions/upcoming     - Not started yet
//! GET    /api/exhibitions/past         - Already ended
//! GET    /api/exhibitions/{id}         - One exhibition
//! POST   /api/exhibitions              - Create (admin, multipart)
//! PUT    /api/exhibitions/{id}         - Update (admin, multipart)
//! DELETE /api/exhibitions/{id}         - Delete (admin)
//!
//! # Cart (bearer)
//! GET    /api/cart                     - Get or create
//! POST   /api/cart/add                 - Add artwork
//! PUT    /api/cart/update/{artworkId}  - Set quantity
//! DELETE /api/cart/remove/{artworkId}  - Remove line
//! DELETE /api/cart/clear               - Empty cart
//!
//! # Orders (bearer)
//! POST   /api/orders                   - Checkout
//! GET    /api/orders                   - Own orders (all for admin)
//! GET    /api/orders/{id}              - One order (owner or admin)
//! PUT    /api/orders/{id}              - Change status (admin)
//!
//! # Users (admin)
//! GET    /api/users                    - All users
//! PUT    /api/users/{id}               - Update user
//! DELETE /api/users/{id}               - Delete user
//!
//! # Static
//! GET    /uploads/*                    - Uploaded images
//! ```

pub mod artworks;
pub mod auth;
pub mod cart;
pub mod exhibitions;
pub mod orders;
pub mod users;

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::Response,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, request_id_middleware, security_headers_middleware};
use crate::services::uploads::{ImageStore, MAX_IMAGE_BYTES};
use crate::state::AppState;

/// Request body limit for multipart catalog forms: one image plus text fields.
const CATALOG_FORM_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// JSON body extractor whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path extractor whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathId<T>(pub T);

/// Plain acknowledgement body for deletes.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    #[must_use]
    pub const fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

/// Create the auth routes that are not rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/user", get(auth::current_user))
}

/// Create the credential routes, wrapped in the auth rate limiter.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
}

/// Create the artwork routes router.
pub fn artwork_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(artworks::index).post(artworks::create))
        .route("/featured", get(artworks::featured))
        .route(
            "/{id}",
            get(artworks::show)
                .put(artworks::update)
                .delete(artworks::destroy),
        )
        .layer(DefaultBodyLimit::max(CATALOG_FORM_LIMIT))
}

/// Create the exhibition routes router.
pub fn exhibition_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(exhibitions::index).post(exhibitions::create))
        .route("/current", get(exhibitions::current))
        .route("/upcoming", get(exhibitions::upcoming))
        .route("/past", get(exhibitions::past))
        .route(
            "/{id}",
            get(exhibitions::show)
                .put(exhibitions::update)
                .delete(exhibitions::destroy),
        )
        .layer(DefaultBodyLimit::max(CATALOG_FORM_LIMIT))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update/{artwork_id}", put(cart::update))
        .route("/remove/{artwork_id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show).put(orders::update_status))
}

/// Create the user administration routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", put(users::update).delete(users::destroy))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes().merge(credential_routes()))
        .nest("/api/artworks", artwork_routes())
        .nest("/api/exhibitions", exhibition_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/users", user_routes())
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Build the complete application: routes, static uploads and middleware.
///
/// Sentry layers are added by the binary, since they need an initialized
/// client.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images().root());
    let cors = cors_layer(&state.config().cors_origin);

    Router::new()
        .merge(routes())
        .nest_service(ImageStore::PUBLIC_PREFIX, uploads)
        .with_state(state)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::extract::Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
