//! Authentication service.
//!
//! Username/password registration and login. A successful login issues a new
//! session token through [`SessionStore`], superseding any earlier one.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use cartwheel_core::Username;

use super::SessionStore;
use crate::db::{RepositoryError, Store};
use crate::models::{LoginResponse, User};

/// Authentication service.
///
/// Handles user registration, login, and user listing.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::EmptyPassword` if no password was given.
    /// Returns `AuthError::UserAlreadyExists` if the username is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .insert_user(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with username and password, issuing a fresh session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::EmptyPassword` if a
    /// field is blank.
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidUsername(
                cartwheel_core::UsernameError::Empty,
            ));
        }
        validate_password(password)?;

        // A name that could never have been registered cannot log in.
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = {
            let mut tx = self.store.begin().await?;
            tx.find_credentials(&username).await?
        }
        .ok_or(AuthError::InvalidCredentials)?;

        if let Err(e) = verify_password(password, &password_hash) {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(e);
        }

        let token = SessionStore::new(self.store).issue(user.id).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse { token, user })
    }

    /// List every registered user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_users().await?)
    }
}

/// Validate password requirements.
const fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
