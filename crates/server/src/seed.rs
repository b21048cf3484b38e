//! Sample data: an admin account and a small electronics-and-shoes catalog.
//!
//! Seeding is idempotent. The admin user is created only when missing and
//! the items only when the catalog is empty.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::db::Store;
use crate::services::{AuthError, AuthService, Catalog, CatalogError};

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Password used for the administrator unless another is supplied.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// A catalog entry to seed: name, description, price in cents.
struct SampleItem {
    name: &'static str,
    description: &'static str,
    cents: i64,
}

const SAMPLE_ITEMS: &[SampleItem] = &[
    SampleItem {
        name: "iPhone 14",
        description: "Apple smartphone with A15 Bionic chip",
        cents: 99_999,
    },
    SampleItem {
        name: "Samsung Galaxy S23",
        description: "Android flagship with Snapdragon 8 Gen 2",
        cents: 89_999,
    },
    SampleItem {
        name: "MacBook Pro",
        description: "14-inch laptop with M2 Pro chip",
        cents: 199_999,
    },
    SampleItem {
        name: "Dell XPS 13",
        description: "Compact 13-inch ultrabook",
        cents: 129_999,
    },
    SampleItem {
        name: "Nike Air Max",
        description: "Running shoes with visible Air cushioning",
        cents: 12_999,
    },
    SampleItem {
        name: "Adidas Ultraboost",
        description: "Running shoes with Boost midsole",
        cents: 14_999,
    },
    SampleItem {
        name: "Sony WH-1000XM4",
        description: "Wireless noise-cancelling headphones",
        cents: 34_999,
    },
    SampleItem {
        name: "Apple Watch Series 8",
        description: "Smartwatch with health and fitness tracking",
        cents: 39_999,
    },
];

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to seed admin user: {0}")]
    Admin(#[from] AuthError),

    #[error("failed to seed catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// What a seeding run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub items_created: usize,
}

/// Seed the admin user and sample catalog.
///
/// # Errors
///
/// Returns `SeedError` if the store fails or `admin_password` is empty.
#[instrument(skip(store, admin_password))]
pub async fn seed_sample_data(
    store: &dyn Store,
    admin_password: &str,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    match AuthService::new(store)
        .register(ADMIN_USERNAME, admin_password)
        .await
    {
        Ok(_) => report.admin_created = true,
        Err(AuthError::UserAlreadyExists) => {
            tracing::debug!("admin user already exists");
        }
        Err(e) => return Err(e.into()),
    }

    let catalog = Catalog::new(store);
    if catalog.count().await? == 0 {
        for sample in SAMPLE_ITEMS {
            catalog
                .create_item(sample.name, sample.description, Decimal::new(sample.cents, 2))
                .await?;
            report.items_created += 1;
        }
    } else {
        tracing::debug!("catalog not empty, skipping sample items");
    }

    tracing::info!(
        admin_created = report.admin_created,
        items_created = report.items_created,
        "sample data seeded"
    );
    Ok(report)
}
