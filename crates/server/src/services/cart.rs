//! Cart Manager.
//!
//! Each user has at most one `active` cart. Adding an item finds or creates
//! it and merges the item into a single line per (cart, item), accumulating
//! quantity across calls.

use thiserror::Error;
use tracing::instrument;

use cartwheel_core::{ItemId, Quantity, QuantityError, UserId};

use super::catalog::resolve_item;
use crate::db::{RepositoryError, Store, StoreTx};
use crate::models::{Cart, CartLine, CartRecord};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The item to add is not in the catalog.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// The quantity cannot be stored.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Resolves and mutates users' carts.
pub struct CartManager<'a> {
    store: &'a dyn Store,
}

impl<'a> CartManager<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add `requested` units of an item to the user's active cart.
    ///
    /// A missing, zero, or negative `requested` adds one unit. The cart is
    /// created if the user has none active. Runs in one transaction holding
    /// the user's lock, so concurrent calls cannot create two active carts or
    /// lose an increment.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the item does not exist.
    /// Returns `CartError::InvalidQuantity` if the quantity, alone or
    /// accumulated, exceeds the storable maximum.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        requested: Option<i64>,
    ) -> Result<Cart, CartError> {
        let quantity = Quantity::from_requested(requested)?;

        let mut tx = self.store.begin().await?;
        if tx.find_item(item_id).await?.is_none() {
            return Err(CartError::ItemNotFound(item_id));
        }

        tx.lock_user(user_id).await?;
        let cart = match tx.find_active_cart(user_id).await? {
            Some(cart) => cart,
            None => {
                let cart = tx.insert_active_cart(user_id).await?;
                tracing::info!(cart_id = %cart.id, "active cart created");
                cart
            }
        };

        match tx.find_cart_line(cart.id, item_id).await? {
            Some(line) => {
                let merged = line.quantity.accumulate(quantity)?;
                tx.set_cart_line_quantity(line.id, merged).await?;
            }
            None => {
                tx.insert_cart_line(cart.id, item_id, quantity).await?;
            }
        }

        let cart = load_cart(tx.as_mut(), cart).await?;
        tx.commit().await?;

        tracing::info!(cart_id = %cart.id, %item_id, %quantity, "item added to cart");
        Ok(cart)
    }

    /// Every cart the user has owned, active and ordered, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn list_carts(&self, user_id: UserId) -> Result<Vec<Cart>, CartError> {
        let mut tx = self.store.begin().await?;
        let records = tx.list_carts(user_id).await?;

        let mut carts = Vec::with_capacity(records.len());
        for record in records {
            carts.push(load_cart(tx.as_mut(), record).await?);
        }
        Ok(carts)
    }
}

/// Attach lines and their items to a stored cart.
async fn load_cart(tx: &mut dyn StoreTx, record: CartRecord) -> Result<Cart, RepositoryError> {
    let records = tx.list_cart_lines(record.id).await?;

    let mut lines = Vec::with_capacity(records.len());
    for line in records {
        let item = resolve_item(tx, line.item_id).await?;
        lines.push(CartLine::resolve(line, item));
    }
    Ok(Cart::assemble(record, lines))
}
