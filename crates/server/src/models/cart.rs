//! Cart types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{CartId, CartLineId, CartStatus, ItemId, Quantity, UserId};

use super::Item;

/// A cart row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line row as stored. At most one exists per (cart, item).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRecord {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub item_id: ItemId,
    pub quantity: Quantity,
}

/// A cart with its lines and their items resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    #[serde(rename = "cart_items")]
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One item on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub item_id: ItemId,
    pub quantity: Quantity,
    pub item: Item,
}

impl Cart {
    /// Combine a stored cart with its resolved lines.
    #[must_use]
    pub fn assemble(record: CartRecord, lines: Vec<CartLine>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            status: record.status,
            lines,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Find the line holding `item_id`, if any.
    #[must_use]
    pub fn line_for(&self, item_id: ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }
}

impl CartLine {
    /// Attach the resolved catalog item to a stored line.
    #[must_use]
    pub const fn resolve(record: CartLineRecord, item: Item) -> Self {
        Self {
            id: record.id,
            cart_id: record.cart_id,
            item_id: record.item_id,
            quantity: record.quantity,
            item,
        }
    }
}
