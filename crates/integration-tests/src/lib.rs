//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no external services)
//! cargo test -p cartwheel-integration-tests
//!
//! # Live server and PostgreSQL suites
//! CARTWHEEL_BASE_URL=http://localhost:8080 \
//! CARTWHEEL_TEST_DATABASE_URL=postgres://localhost/cartwheel_test \
//!     cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_*` - Full router over `MemoryStore`, driven with `tower::ServiceExt::oneshot`
//! - `live_server` - A running server over HTTP (`reqwest`)
//! - `pg_store` - `PgStore` transactions and concurrency against a real database

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use cartwheel_server::db::MemoryStore;
use cartwheel_server::{AppState, app};

/// A response with its body parsed as JSON (`Value::Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// The full application over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    /// Handle to the same data the router uses.
    pub store: MemoryStore,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build the router over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let router = app(AppState::new(store.clone()));
        Self { router, store }
    }

    /// Send a request. `token` becomes an `Authorization: Bearer` header.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let auth = token.map(|t| format!("Bearer {t}"));
        self.send(method, uri, auth.as_deref(), body).await
    }

    /// Send a request with a raw `Authorization` header value.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send_request(request).await
    }

    /// Send a prebuilt request.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Register `username` and log in, returning the session token.
    ///
    /// # Panics
    ///
    /// Panics if either step fails.
    pub async fn signup(&self, username: &str) -> String {
        let credentials = serde_json::json!({ "username": username, "password": "secret" });

        let created = self
            .request(Method::POST, "/users", None, Some(credentials.clone()))
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);

        let login = self
            .request(Method::POST, "/users/login", None, Some(credentials))
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        login.body["token"]
            .as_str()
            .expect("login returned no token")
            .to_string()
    }

    /// Create a catalog item, returning its ID.
    ///
    /// # Panics
    ///
    /// Panics if the item cannot be created.
    pub async fn create_item(&self, name: &str, price: &str) -> i64 {
        let created = self
            .request(
                Method::POST,
                "/items",
                None,
                Some(serde_json::json!({ "name": name, "description": "", "price": price })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
        created.body["id"].as_i64().expect("item has no id")
    }
}
