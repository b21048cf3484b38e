//! Catalog lookups and administrative item creation.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use cartwheel_core::{ItemId, Price, PriceError};

use crate::db::{RepositoryError, Store, StoreTx};
use crate::models::{Item, NewItem};

/// Maximum length of an item name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Read access to the catalog, plus item creation.
pub struct Catalog<'a> {
    store: &'a dyn Store,
}

impl<'a> Catalog<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Look up one item.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ItemNotFound` if no item has this ID.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        let mut tx = self.store.begin().await?;
        tx.find_item(id)
            .await?
            .ok_or(CatalogError::ItemNotFound(id))
    }

    /// List every item, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_items().await?)
    }

    /// Add an item to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidItem` if the name is blank or too long.
    /// Returns `CatalogError::InvalidPrice` if the price is negative, has
    /// sub-cent precision, or exceeds the storable maximum.
    #[instrument(skip(self, description))]
    pub async fn create_item(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> Result<Item, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidItem("name is required".to_owned()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CatalogError::InvalidItem(format!(
                "name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let new_item = NewItem {
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::unit(price)?,
        };

        let mut tx = self.store.begin().await?;
        let item = tx.insert_item(&new_item).await?;
        tx.commit().await?;

        tracing::info!(item_id = %item.id, price = %item.price, "item created");
        Ok(item)
    }

    /// Number of items in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn count(&self) -> Result<i64, CatalogError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.count_items().await?)
    }
}

/// Resolve an item referenced by a cart or order line.
///
/// Lines only ever point at existing items, so a miss means the data is broken.
pub(crate) async fn resolve_item(
    tx: &mut dyn StoreTx,
    id: ItemId,
) -> Result<Item, RepositoryError> {
    tx.find_item(id)
        .await?
        .ok_or_else(|| RepositoryError::DataCorruption(format!("line references missing item {id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        let item = catalog
            .create_item(" Widget ", "A widget", Decimal::new(1999, 2))
            .await
            .unwrap();
        assert_eq!(item.name, "Widget");

        let fetched = catalog.get_item(item.id).await.unwrap();
        assert_eq!(fetched, item);
        assert_eq!(catalog.list_items().await.unwrap(), vec![item]);
        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_item() {
        let store = MemoryStore::new();
        assert!(matches!(
            Catalog::new(&store).get_item(ItemId::new(99)).await,
            Err(CatalogError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store);

        assert!(matches!(
            catalog.create_item("   ", "", Decimal::ONE).await,
            Err(CatalogError::InvalidItem(_))
        ));
        assert!(matches!(
            catalog.create_item("Widget", "", Decimal::NEGATIVE_ONE).await,
            Err(CatalogError::InvalidPrice(PriceError::Negative))
        ));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }
}
