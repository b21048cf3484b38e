//! Catalog queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use cartwheel_core::{ItemId, Price};

use super::RepositoryError;
use crate::models::{Item, NewItem};

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: ItemId,
    name: String,
    description: String,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(super) async fn insert(
    conn: &mut PgConnection,
    item: &NewItem,
) -> Result<Item, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(
        r"
        INSERT INTO shop.items (name, description, price)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, price, created_at, updated_at
        ",
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price.amount())
    .fetch_one(conn)
    .await?;

    row.try_into()
}

pub(super) async fn find(
    conn: &mut PgConnection,
    id: ItemId,
) -> Result<Option<Item>, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(
        r"
        SELECT id, name, description, price, created_at, updated_at
        FROM shop.items
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(Item::try_from).transpose()
}

pub(super) async fn list(conn: &mut PgConnection) -> Result<Vec<Item>, RepositoryError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r"
        SELECT id, name, description, price, created_at, updated_at
        FROM shop.items
        ORDER BY id
        ",
    )
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(Item::try_from).collect()
}

pub(super) async fn count(conn: &mut PgConnection) -> Result<i64, RepositoryError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.items")
        .fetch_one(conn)
        .await?;
    Ok(count)
}
