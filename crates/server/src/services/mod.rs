//! Business logic services.
//!
//! Each service borrows the [`Store`](crate::db::Store) for the duration of a
//! call and runs every operation in its own transaction.
//!
//! # Services
//!
//! - `auth` - Registration, login, user listing
//! - `session` - Session token issue and authentication
//! - `catalog` - Item lookup and creation
//! - `cart` - Active cart resolution and item merging
//! - `checkout` - Cart to order conversion and order history

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod session;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartManager};
pub use catalog::{Catalog, CatalogError};
pub use checkout::{CheckoutEngine, CheckoutError};
pub use session::SessionStore;
