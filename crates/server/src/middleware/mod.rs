//! HTTP middleware.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS
//! 3. `TraceLayer` (request span with an empty `request_id` field)
//! 4. Request ID (fills the span field, tags Sentry, echoes the header)
//!
//! Authentication is not a layer: protected handlers take a [`RequireAuth`]
//! argument.

pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::RequireAuth;
pub use cors::{InvalidOrigin, cors_layer};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
