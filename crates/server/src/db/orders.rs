//! Order and order line queries. Orders are insert-only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use cartwheel_core::{CartId, ItemId, OrderId, OrderLineId, OrderStatus, Price, Quantity, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{OrderLineRecord, OrderRecord};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    cart_id: CartId,
    status: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total = Price::new(row.total_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total on order {}: {e}", row.id))
        })?;

        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            cart_id: row.cart_id,
            status,
            total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    item_id: ItemId,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLineRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity on order line {}: {e}", row.id))
        })?;
        let unit_price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price on order line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            item_id: row.item_id,
            quantity,
            unit_price,
        })
    }
}

/// Create a completed order.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the cart already produced an order.
pub(super) async fn insert(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    total: Price,
) -> Result<OrderRecord, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO shop.orders (user_id, cart_id, status, total_price)
        VALUES ($1, $2, 'completed', $3)
        RETURNING id, user_id, cart_id, status::text AS status, total_price, created_at, updated_at
        ",
    )
    .bind(user_id)
    .bind(cart_id)
    .bind(total.amount())
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "cart already ordered"))?;

    row.try_into()
}

pub(super) async fn insert_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    item_id: ItemId,
    quantity: Quantity,
    unit_price: Price,
) -> Result<OrderLineRecord, RepositoryError> {
    let row = sqlx::query_as::<_, OrderLineRow>(
        r"
        INSERT INTO shop.order_lines (order_id, item_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        RETURNING id, order_id, item_id, quantity, price
        ",
    )
    .bind(order_id)
    .bind(item_id)
    .bind(quantity.get())
    .bind(unit_price.amount())
    .fetch_one(conn)
    .await?;

    row.try_into()
}

pub(super) async fn list_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<OrderRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, user_id, cart_id, status::text AS status, total_price, created_at, updated_at
        FROM shop.orders
        WHERE user_id = $1
        ORDER BY id
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(OrderRecord::try_from).collect()
}

pub(super) async fn list_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderLineRecord>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
        r"
        SELECT id, order_id, item_id, quantity, price
        FROM shop.order_lines
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(OrderLineRecord::try_from).collect()
}
