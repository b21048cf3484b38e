//! In-process backend with the same transactional semantics as `PgStore`.
//!
//! A transaction takes the store-wide lock, works on a private copy of the
//! tables, and swaps that copy in on commit. Transactions are therefore fully
//! serialized, which trivially satisfies the per-user locking contract.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cartwheel_core::{
    CartId, CartLineId, CartStatus, ItemId, OrderId, OrderLineId, OrderStatus, Price, Quantity,
    SessionToken, UserId, Username,
};

use super::{RepositoryError, Store, StoreTx};
use crate::models::{
    CartLineRecord, CartRecord, Item, NewItem, OrderLineRecord, OrderRecord, User,
};

/// A store operation that can be made to fail once, for exercising rollback
/// and readiness paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Ping,
    InsertCartLine,
    InsertOrder,
    InsertOrderLine,
    MarkCartOrdered,
    Commit,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
    session_token: Option<SessionToken>,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i64,
    item: i64,
    cart: i64,
    cart_line: i64,
    order: i64,
    order_line: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, StoredUser>,
    items: BTreeMap<ItemId, Item>,
    carts: BTreeMap<CartId, CartRecord>,
    cart_lines: BTreeMap<CartLineId, CartLineRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
    order_lines: BTreeMap<OrderLineId, OrderLineRecord>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Tables,
    fail_point: Option<FailPoint>,
}

impl Shared {
    fn trip(&mut self, point: FailPoint) -> Result<(), RepositoryError> {
        if self.fail_point == Some(point) {
            self.fail_point = None;
            return Err(RepositoryError::Unavailable(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }
}

/// Thread-safe in-memory storage.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call at `point` fail with `RepositoryError::Unavailable`.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn fail_at(&self, point: FailPoint) {
        self.shared.lock().await.fail_point = Some(point);
    }

    /// Change an item's catalog price outside of any service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn set_item_price(&self, id: ItemId, price: Price) -> Result<(), RepositoryError> {
        let mut shared = self.shared.lock().await;
        let item = shared
            .tables
            .items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        item.price = price;
        item.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, RepositoryError> {
        let shared = Arc::clone(&self.shared).lock_owned().await;
        let working = shared.tables.clone();
        Ok(Box::new(MemoryTx { shared, working }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.shared.lock().await.trip(FailPoint::Ping)
    }
}

/// An open in-memory transaction. Discards its working copy on drop.
struct MemoryTx {
    shared: OwnedMutexGuard<Shared>,
    working: Tables,
}

impl MemoryTx {
    fn trip(&mut self, point: FailPoint) -> Result<(), RepositoryError> {
        self.shared.trip(point)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_user(
        &mut self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let tables = &mut self.working;
        if tables
            .users
            .values()
            .any(|stored| &stored.user.username == username)
        {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(next_id(&mut tables.sequences.user)),
            username: username.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
                session_token: None,
            },
        );
        Ok(user)
    }

    async fn find_credentials(
        &mut self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .find(|stored| &stored.user.username == username)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn set_session_token(
        &mut self,
        user_id: UserId,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let stored = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        stored.session_token = Some(token.clone());
        stored.user.updated_at = Utc::now();
        Ok(())
    }

    async fn find_user_by_token(
        &mut self,
        token: &SessionToken,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .find(|stored| stored.session_token.as_ref() == Some(token))
            .map(|stored| stored.user.clone()))
    }

    async fn list_users(&mut self) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn lock_user(&mut self, user_id: UserId) -> Result<(), RepositoryError> {
        // The store-wide lock is already held.
        if self.working.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn insert_item(&mut self, item: &NewItem) -> Result<Item, RepositoryError> {
        let tables = &mut self.working;
        let now = Utc::now();
        let item = Item {
            id: ItemId::new(next_id(&mut tables.sequences.item)),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            created_at: now,
            updated_at: now,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn list_items(&mut self) -> Result<Vec<Item>, RepositoryError> {
        Ok(self.working.items.values().cloned().collect())
    }

    async fn count_items(&mut self) -> Result<i64, RepositoryError> {
        i64::try_from(self.working.items.len())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn find_active_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .find(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
            .cloned())
    }

    async fn insert_active_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<CartRecord, RepositoryError> {
        if self.find_active_cart(user_id).await?.is_some() {
            return Err(RepositoryError::Conflict(
                "user already has an active cart".to_owned(),
            ));
        }

        let tables = &mut self.working;
        let now = Utc::now();
        let cart = CartRecord {
            id: CartId::new(next_id(&mut tables.sequences.cart)),
            user_id,
            status: CartStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn find_checkout_cart(
        &mut self,
        cart_id: CartId,
        user_id: UserId,
    ) -> Result<Option<CartRecord>, RepositoryError> {
        Ok(self
            .working
            .carts
            .get(&cart_id)
            .filter(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
            .cloned())
    }

    async fn list_carts(&mut self, user_id: UserId) -> Result<Vec<CartRecord>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .filter(|cart| cart.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
    ) -> Result<Option<CartLineRecord>, RepositoryError> {
        Ok(self
            .working
            .cart_lines
            .values()
            .find(|line| line.cart_id == cart_id && line.item_id == item_id)
            .cloned())
    }

    async fn insert_cart_line(
        &mut self,
        cart_id: CartId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError> {
        self.trip(FailPoint::InsertCartLine)?;
        if self.find_cart_line(cart_id, item_id).await?.is_some() {
            return Err(RepositoryError::Conflict("item already on cart".to_owned()));
        }

        let tables = &mut self.working;
        let line = CartLineRecord {
            id: CartLineId::new(next_id(&mut tables.sequences.cart_line)),
            cart_id,
            item_id,
            quantity,
        };
        tables.cart_lines.insert(line.id, line.clone());
        Ok(line)
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLineRecord, RepositoryError> {
        let line = self
            .working
            .cart_lines
            .get_mut(&line_id)
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn list_cart_lines(
        &mut self,
        cart_id: CartId,
    ) -> Result<Vec<CartLineRecord>, RepositoryError> {
        Ok(self
            .working
            .cart_lines
            .values()
            .filter(|line| line.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn mark_cart_ordered(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        self.trip(FailPoint::MarkCartOrdered)?;
        let cart = self
            .working
            .carts
            .get_mut(&cart_id)
            .filter(|cart| cart.status == CartStatus::Active)
            .ok_or(RepositoryError::NotFound)?;
        cart.status = CartStatus::Ordered;
        cart.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        cart_id: CartId,
        total: Price,
    ) -> Result<OrderRecord, RepositoryError> {
        self.trip(FailPoint::InsertOrder)?;
        let tables = &mut self.working;
        if tables.orders.values().any(|order| order.cart_id == cart_id) {
            return Err(RepositoryError::Conflict("cart already ordered".to_owned()));
        }

        let now = Utc::now();
        let order = OrderRecord {
            id: OrderId::new(next_id(&mut tables.sequences.order)),
            user_id,
            cart_id,
            status: OrderStatus::Completed,
            total,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_line(
        &mut self,
        order_id: OrderId,
        item_id: ItemId,
        quantity: Quantity,
        unit_price: Price,
    ) -> Result<OrderLineRecord, RepositoryError> {
        self.trip(FailPoint::InsertOrderLine)?;
        let tables = &mut self.working;
        let line = OrderLineRecord {
            id: OrderLineId::new(next_id(&mut tables.sequences.order_line)),
            order_id,
            item_id,
            quantity,
            unit_price,
        };
        tables.order_lines.insert(line.id, line.clone());
        Ok(line)
    }

    async fn list_orders(&mut self, user_id: UserId) -> Result<Vec<OrderRecord>, RepositoryError> {
        Ok(self
            .working
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_order_lines(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLineRecord>, RepositoryError> {
        Ok(self
            .working
            .order_lines
            .values()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), RepositoryError> {
        self.trip(FailPoint::Commit)?;
        let Self {
            mut shared,
            working,
        } = *self;
        shared.tables = working;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn username(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&username("alice"), "hash").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_discards_writes() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&username("alice"), "hash").await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&username("alice"), "hash").await.unwrap();

        let err = tx.insert_user(&username("alice"), "other").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_second_active_cart_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&username("alice"), "hash").await.unwrap();

        tx.insert_active_cart(user.id).await.unwrap();
        let err = tx.insert_active_cart(user.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mark_ordered_only_once() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&username("alice"), "hash").await.unwrap();
        let cart = tx.insert_active_cart(user.id).await.unwrap();

        tx.mark_cart_ordered(cart.id).await.unwrap();
        assert!(matches!(
            tx.mark_cart_ordered(cart.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(tx.find_active_cart(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_point_trips_once() {
        let store = MemoryStore::new();
        store.fail_at(FailPoint::Commit).await;

        let tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.commit().await,
            Err(RepositoryError::Unavailable(_))
        ));

        let tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_fail_point() {
        let store = MemoryStore::new();
        store.ping().await.unwrap();

        store.fail_at(FailPoint::Ping).await;
        assert!(matches!(
            store.ping().await,
            Err(RepositoryError::Unavailable(_))
        ));
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_token_lookup() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(&username("alice"), "hash").await.unwrap();
        let token = SessionToken::from_random_bytes(&[7; SessionToken::BYTES]);

        assert!(tx.find_user_by_token(&token).await.unwrap().is_none());
        tx.set_session_token(user.id, &token).await.unwrap();
        assert_eq!(
            tx.find_user_by_token(&token).await.unwrap().unwrap().id,
            user.id
        );
    }
}
