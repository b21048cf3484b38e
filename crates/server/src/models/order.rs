//! Order types.
//!
//! Orders are written once at checkout and never updated. `unit_price` on an
//! order line is the catalog price at that moment; the nested `item` shows
//! the catalog entry as it is now.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{CartId, ItemId, OrderId, OrderLineId, OrderStatus, Price, Quantity, UserId};

use super::Item;

/// An order row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    /// The cart this order was created from.
    pub cart_id: CartId,
    pub status: OrderStatus,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRecord {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: Quantity,
    pub unit_price: Price,
}

/// An order with its lines and their items resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    pub status: OrderStatus,
    #[serde(rename = "total_price")]
    pub total: Price,
    #[serde(rename = "order_items")]
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchased item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: Quantity,
    #[serde(rename = "price")]
    pub unit_price: Price,
    pub item: Item,
}

impl Order {
    /// Combine a stored order with its resolved lines.
    #[must_use]
    pub fn assemble(record: OrderRecord, lines: Vec<OrderLine>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            cart_id: record.cart_id,
            status: record.status,
            total: record.total,
            lines,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl OrderLine {
    /// Attach the resolved catalog item to a stored line.
    #[must_use]
    pub const fn resolve(record: OrderLineRecord, item: Item) -> Self {
        Self {
            id: record.id,
            order_id: record.order_id,
            item_id: record.item_id,
            quantity: record.quantity,
            unit_price: record.unit_price,
            item,
        }
    }
}
