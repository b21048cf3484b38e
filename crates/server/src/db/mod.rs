//! Storage for users, the catalog, carts, and orders.
//!
//! Every service works through a [`Store`], which hands out [`StoreTx`]
//! transactions. A transaction is all-or-nothing: nothing it wrote is visible
//! to other transactions until [`StoreTx::commit`], and dropping it without
//! committing discards every write.
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL` via a `sqlx` pool (production)
//! - [`MemoryStore`] - in-process maps with the same semantics (tests, demos)
//!
//! # Schema: `shop`
//!
//! - `users` - Accounts, password hashes, current session token
//! - `items` - Catalog
//! - `carts` - One `active` cart per user (partial unique index), many `ordered`
//! - `cart_lines` - Unique per (cart, item)
//! - `orders` - Unique per cart
//! - `order_lines` - Quantity and unit price captured at checkout
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! ```

mod carts;
mod items;
mod memory;
mod orders;
mod postgres;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartwheel_core::{
    CartId, CartLineId, ItemId, OrderId, Price, Quantity, SessionToken, UserId, Username,
};

use crate::models::{
    CartLineRecord, CartRecord, Item, NewItem, OrderLineRecord, OrderRecord, User,
};

#[cfg(any(test, feature = "test-util"))]
pub use memory::FailPoint;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backend refused the operation without a database error.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Entry point to a storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend cannot start one.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if it is not.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// An open storage transaction.
///
/// Lookups return `Ok(None)` for missing rows; updates addressed to a missing
/// row return `RepositoryError::NotFound`.
#[async_trait]
pub trait StoreTx: Send {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user. `RepositoryError::Conflict` if the username is taken.
    async fn insert_user(
        &mut self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Fetch a user together with their password hash.
    async fn find_credentials(
        &mut self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Replace the user's session token.
    async fn set_session_token(
        &mut self,
        user_id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError>;

    /// Fetch the user currently holding `token`.
    async fn find_user_by_token(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError>;

    /// All users in registration order.
    async fn list_users(&mut self) -> Result<Vec<User>, RepositoryError>;

    /// Serialize cart and checkout work for one user until this transaction ends.
    async fn lock_user(&mut self, user_id: UserId) -> Result<(), RepositoryError>;

    // =========================================================================
    // Catalog
    // =========================================================================

    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError>;

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    async fn list_items(&mut self) -> Result<Vec<Item>, RepositoryError>;

    async fn count_items(&mut self) -> Result<i64, RepositoryError>;

    // =========================================================================
    // Carts
    // =========================================================================

    /// The user's `active` cart, if any.
    async fn find_active_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError>;

    /// Create an empty `active` cart. `RepositoryError::Conflict` if the user
    /// already has one.
    async fn insert_active_cart(&mut self, user_id: UserId)
    -> Result<CartRecord, RepositoryError>;

    /// Cart `cart_id` if it belongs to `user_id` and is still `active`.
    /// Postgres locks the row until the transaction ends.
    async fn find_checkout_cart(
        &mut self,
        cart_id: CartId,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError>;

    /// Every cart the user has owned, oldest first.
    async fn list_carts(&mut self, user_id: UserId) -> Result<Vec<CartRecord>, RepositoryError>;

    async fn find_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
    ) -> Result<Option<CartLineRecord>, RepositoryError>;

    /// Add a line. `RepositoryError::Conflict` if the item is already on the cart.
    async fn insert_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError>;

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError>;

    /// Lines of a cart, oldest first.
    async fn list_cart_lines(
        &mut self,
        cart_id: CartId,
    ) -> Result<Vec<CartLineRecord>, RepositoryError>;

    /// Flip an `active` cart to `ordered`. `RepositoryError::NotFound` if the
    /// cart is missing or no longer active.
    async fn mark_cart_ordered(&mut self, cart_id: CartId) -> Result<(), RepositoryError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create a completed order. `RepositoryError::Conflict` if the cart
    /// already produced one.
    async fn insert_order(
        &mut self,
        user_id: UserId,
        cart_id: CartId,
        total: Price,
    ) -> Result<OrderRecord, RepositoryError>;

    async fn insert_order_line(
        &mut self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: Quantity,
        unit_price: Price,
    ) -> Result<OrderLineRecord, RepositoryError>;

    /// Every order the user has placed, oldest first.
    async fn list_orders(&mut self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError>;

    async fn list_order_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLineRecord>, RepositoryError>;

    // =========================================================================
    // Completion
    // =========================================================================

    /// Make every write in this transaction visible.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}
