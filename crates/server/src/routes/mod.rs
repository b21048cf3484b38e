//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (pings the store)
//!
//! # Users
//! POST /users                  - Register
//! POST /users/login            - Login, returns a session token
//! GET  /users                  - List users
//!
//! # Catalog
//! POST /items                  - Create an item
//! GET  /items                  - List items
//! GET  /items/{id}             - Item detail
//!
//! # Carts (requires auth)
//! POST /carts                  - Add an item to the active cart
//! GET  /carts                  - List carts
//!
//! # Orders (requires auth)
//! POST /orders                 - Check out a cart
//! GET  /orders                 - List orders
//! ```

pub mod carts;
pub mod health;
pub mod items;
pub mod json;
pub mod orders;
pub mod users;

use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::register))
        .route("/login", post(users::login))
}

/// Create the catalog routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index).post(items::create))
        .route("/{id}", get(items::show))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/items", item_routes())
        .route("/carts", get(carts::index).post(carts::add_item))
        .route("/orders", get(orders::index).post(orders::checkout))
}

/// The complete application: API routes, health checks, request IDs and
/// request tracing, bound to `state`.
///
/// CORS and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

/// Root span for a request. `request_id` and `user_id` are filled in later.
fn make_request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
}
