//! `PostgreSQL` backend.
//!
//! Transactions run at `READ COMMITTED`. Per-user serialization comes from
//! [`StoreTx::lock_user`] taking a row lock on the user, and checkout
//! additionally locks the cart row. The partial unique index on active carts
//! and the unique `orders.cart_id` backstop both invariants.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use cartwheel_core::{
    CartId, CartLineId, ItemId, OrderId, Price, Quantity, SessionToken, UserId, Username,
};

use super::{RepositoryError, Store, StoreTx, carts, items, orders, users};
use crate::models::{
    CartLineRecord, CartRecord, Item, NewItem, OrderLineRecord, OrderRecord, User,
};

/// Storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open `PostgreSQL` transaction. Rolls back on drop.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_user(
        &mut self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        users::insert(&mut *self.tx, username, password_hash).await
    }

    async fn find_credentials(
        &mut self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        users::find_credentials(&mut *self.tx, username).await
    }

    async fn set_session_token(
        &mut self,
        user_id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        users::set_session_token(&mut *self.tx, user_id, token).await
    }

    async fn find_user_by_token(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError> {
        users::find_by_token(&mut *self.tx, token).await
    }

    async fn list_users(&mut self) -> Result<Vec<User>, RepositoryError> {
        users::list(&mut *self.tx).await
    }

    async fn lock_user(&mut self, user_id: UserId) -> Result<(), RepositoryError> {
        users::lock(&mut *self.tx, user_id).await
    }

    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError> {
        items::insert(&mut *self.tx, item).await
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        items::find(&mut *self.tx, id).await
    }

    async fn list_items(&mut self) -> Result<Vec<Item>, RepositoryError> {
        items::list(&mut *self.tx).await
    }

    async fn count_items(&mut self) -> Result<i64, RepositoryError> {
        items::count(&mut *self.tx).await
    }

    async fn find_active_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError> {
        carts::find_active(&mut *self.tx, user_id).await
    }

    async fn insert_active_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<CartRecord, RepositoryError> {
        carts::insert_active(&mut *self.tx, user_id).await
    }

    async fn find_checkout_cart(
        &mut self,
        cart_id: CartId,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError> {
        carts::find_for_checkout(&mut *self.tx, cart_id, user_id).await
    }

    async fn list_carts(&mut self, user_id: UserId) -> Result<Vec<CartRecord>, RepositoryError> {
        carts::list_for_user(&mut *self.tx, user_id).await
    }

    async fn find_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
    ) -> Result<Option<CartLineRecord>, RepositoryError> {
        carts::find_line(&mut *self.tx, cart_id, item_id).await
    }

    async fn insert_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError> {
        carts::insert_line(&mut *self.tx, cart_id, item_id, quantity).await
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError> {
        carts::set_line_quantity(&mut *self.tx, line_id, quantity).await
    }

    async fn list_cart_lines(
        &mut self,
        cart_id: CartId,
    ) -> Result<Vec<CartLineRecord>, RepositoryError> {
        carts::list_lines(&mut *self.tx, cart_id).await
    }

    async fn mark_cart_ordered(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        carts::mark_ordered(&mut *self.tx, cart_id).await
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        cart_id: CartId,
        total: Price,
    ) -> Result<OrderRecord, RepositoryError> {
        orders::insert(&mut *self.tx, user_id, cart_id, total).await
    }

    async fn insert_order_line(
        &mut self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: Quantity,
        unit_price: Price,
    ) -> Result<OrderLineRecord, RepositoryError> {
        orders::insert_line(&mut *self.tx, order_id, item_id, quantity, unit_price).await
    }

    async fn list_orders(&mut self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError> {
        orders::list_for_user(&mut *self.tx, user_id).await
    }

    async fn list_order_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLineRecord>, RepositoryError> {
        orders::list_lines(&mut *self.tx, order_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
