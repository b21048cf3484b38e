//! Sample data command.
//!
//! # Usage
//!
//! ```bash
//! # Admin user "admin" with password "admin123", plus the sample catalog
//! cw-cli seed
//!
//! # Same, with a different admin password
//! cw-cli seed --admin-password 's3cret'
//! ```
//!
//! Safe to run repeatedly: existing users and a non-empty catalog are left
//! untouched.

use thiserror::Error;

use cartwheel_server::db::{self, PgStore};
use cartwheel_server::seed::{SeedError, seed_sample_data};

use super::{DATABASE_URL_VAR, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedCommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Seed the admin user and sample catalog.
///
/// # Errors
///
/// Returns `SeedCommandError` if the URL is missing, the database is
/// unreachable, or an insert fails.
pub async fn run(admin_password: &str) -> Result<(), SeedCommandError> {
    let database_url =
        database_url().ok_or(SeedCommandError::MissingEnvVar(DATABASE_URL_VAR))?;

    let pool = db::create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    let report = seed_sample_data(&store, admin_password).await?;
    tracing::info!(
        admin_created = report.admin_created,
        items_created = report.items_created,
        "Seeding complete!"
    );
    Ok(())
}
