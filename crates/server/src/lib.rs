//! Cartwheel server library.
//!
//! Cart-to-order backend: users and session tokens, a catalog, one active
//! cart per user, and atomic checkout. Exposed as a library so the binary,
//! the CLI, and the integration tests share the same router and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
