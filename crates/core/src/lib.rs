//! Cartwheel Core - Shared domain types.
//!
//! This crate provides the value types used across all Cartwheel components:
//! - `server` - Cart and checkout HTTP API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and their validation rules - no I/O, no
//! database access, no HTTP. Randomness for session tokens is supplied by the
//! caller. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, usernames,
//!   session tokens, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
