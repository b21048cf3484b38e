//! Cart and cart line queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use cartwheel_core::{CartId, CartLineId, CartStatus, ItemId, Quantity, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{CartLineRecord, CartRecord};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for CartRecord {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<CartStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    cart_id: CartId,
    item_id: ItemId,
    quantity: i32,
}

impl TryFrom<CartLineRow> for CartLineRecord {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity on cart line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            cart_id: row.cart_id,
            item_id: row.item_id,
            quantity,
        })
    }
}

pub(super) async fn find_active(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<CartRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, status::text AS status, created_at, updated_at
        FROM shop.carts
        WHERE user_id = $1 AND status = 'active'
        ",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    row.map(CartRecord::try_from).transpose()
}

/// Create an empty active cart.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already has an active cart
/// (partial unique index `carts_one_active_per_user`).
pub(super) async fn insert_active(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CartRecord, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(
        r"
        INSERT INTO shop.carts (user_id, status)
        VALUES ($1, 'active')
        RETURNING id, user_id, status::text AS status, created_at, updated_at
        ",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "user already has an active cart"))?;

    row.try_into()
}

/// Find and lock an active cart owned by `user_id`.
pub(super) async fn find_for_checkout(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<Option<CartRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, status::text AS status, created_at, updated_at
        FROM shop.carts
        WHERE id = $1 AND user_id = $2 AND status = 'active'
        FOR UPDATE
        ",
    )
    .bind(cart_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    row.map(CartRecord::try_from).transpose()
}

pub(super) async fn list_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, status::text AS status, created_at, updated_at
        FROM shop.carts
        WHERE user_id = $1
        ORDER BY id
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(CartRecord::try_from).collect()
}

/// Flip an active cart to ordered.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the cart is missing or already ordered.
pub(super) async fn mark_ordered(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.carts
        SET status = 'ordered', updated_at = now()
        WHERE id = $1 AND status = 'active'
        ",
    )
    .bind(cart_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

// =============================================================================
// Lines
// =============================================================================

pub(super) async fn find_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: ItemId,
) -> Result<Option<CartLineRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT id, cart_id, item_id, quantity
        FROM shop.cart_lines
        WHERE cart_id = $1 AND item_id = $2
        ",
    )
    .bind(cart_id)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;

    row.map(CartLineRecord::try_from).transpose()
}

pub(super) async fn insert_line(
    conn: &mut PgConnection,
    cart_id: CartId,
    item_id: ItemId,
    quantity: Quantity,
) -> Result<CartLineRecord, RepositoryError> {
    let row = sqlx::query_as::<_, CartLineRow>(
        r"
        INSERT INTO shop.cart_lines (cart_id, item_id, quantity)
        VALUES ($1, $2, $3)
        RETURNING id, cart_id, item_id, quantity
        ",
    )
    .bind(cart_id)
    .bind(item_id)
    .bind(quantity.get())
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "item already on cart"))?;

    row.try_into()
}

pub(super) async fn set_line_quantity(
    conn: &mut PgConnection,
    line_id: CartLineId,
    quantity: Quantity,
) -> Result<CartLineRecord, RepositoryError> {
    let row = sqlx::query_as::<_, CartLineRow>(
        r"
        UPDATE shop.cart_lines
        SET quantity = $2, updated_at = now()
        WHERE id = $1
        RETURNING id, cart_id, item_id, quantity
        ",
    )
    .bind(line_id)
    .bind(quantity.get())
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

pub(super) async fn list_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLineRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT id, cart_id, item_id, quantity
        FROM shop.cart_lines
        WHERE cart_id = $1
        ORDER BY id
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(CartLineRecord::try_from).collect()
}
