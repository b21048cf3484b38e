//! Checkout Engine.
//!
//! Converts an active cart into an order. The order, its lines, and the
//! cart's move to `ordered` are written in one transaction: either all of
//! them become visible or none do.

use thiserror::Error;
use tracing::instrument;

use cartwheel_core::{CartId, Price, PriceError, UserId};

use super::catalog::resolve_item;
use crate::db::{RepositoryError, Store, StoreTx};
use crate::models::{Order, OrderLine, OrderRecord};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart is missing, owned by someone else, or already ordered.
    #[error("cart {0} not found or already ordered")]
    CartNotFound(CartId),

    #[error("cart {0} is empty")]
    EmptyCart(CartId),

    /// The order total could not be computed.
    #[error("pricing error: {0}")]
    Pricing(#[from] PriceError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Places orders and reads order history.
pub struct CheckoutEngine<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutEngine<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the user's active cart into an order.
    ///
    /// Every line is priced at the item's current catalog price, and that
    /// price is copied onto the order line.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartNotFound` if the cart does not exist, is
    /// not the user's, or is no longer active.
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId, cart_id: CartId) -> Result<Order, CheckoutError> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(user_id).await?;

        let cart = tx
            .find_checkout_cart(cart_id, user_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(cart_id))?;

        let cart_lines = tx.list_cart_lines(cart.id).await?;
        if cart_lines.is_empty() {
            tracing::warn!(%cart_id, "checkout of empty cart rejected");
            return Err(CheckoutError::EmptyCart(cart_id));
        }

        let mut priced = Vec::with_capacity(cart_lines.len());
        for line in cart_lines {
            let item = resolve_item(tx.as_mut(), line.item_id).await?;
            priced.push((line, item));
        }

        let total = Price::sum(
            priced
                .iter()
                .map(|(line, item)| item.price.line_total(line.quantity))
                .collect::<Result<Vec<_>, _>>()?,
        )?;

        let order = tx.insert_order(user_id, cart.id, total).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => CheckoutError::CartNotFound(cart_id),
            other => CheckoutError::Repository(other),
        })?;

        let mut lines = Vec::with_capacity(priced.len());
        for (line, item) in priced {
            let record = tx
                .insert_order_line(order.id, item.id, line.quantity, item.price)
                .await?;
            lines.push(OrderLine::resolve(record, item));
        }

        tx.mark_cart_ordered(cart.id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, %cart_id, total = %order.total, "order placed");
        Ok(Order::assemble(order, lines))
    }

    /// Every order the user has placed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if the store fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        let mut tx = self.store.begin().await?;
        let records = tx.list_orders(user_id).await?;

        let mut orders = Vec::with_capacity(records.len());
        for record in records {
            orders.push(load_order(tx.as_mut(), record).await?);
        }
        Ok(orders)
    }
}

/// Attach lines and their items to a stored order.
async fn load_order(tx: &mut dyn StoreTx, record: OrderRecord) -> Result<Order, RepositoryError> {
    let records = tx.list_order_lines(record.id).await?;

    let mut lines = Vec::with_capacity(records.len());
    for line in records {
        let item = resolve_item(tx, line.item_id).await?;
        lines.push(OrderLine::resolve(line, item));
    }
    Ok(Order::assemble(record, lines))
}
