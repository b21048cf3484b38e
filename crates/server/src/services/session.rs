//! Session tokens: issue on login, authenticate on every protected request.
//!
//! A user holds at most one token. Issuing a new one overwrites the old,
//! which is the only way a token stops working.

use rand::RngCore;
use tracing::instrument;

use cartwheel_core::{SessionToken, TokenError, UserId};

use super::AuthError;
use crate::db::Store;
use crate::models::User;

/// Maps opaque bearer tokens to users.
pub struct SessionStore<'a> {
    store: &'a dyn Store,
}

impl<'a> SessionStore<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Generate a fresh token for `user_id`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the user does not exist or the
    /// store fails.
    #[instrument(skip(self))]
    pub async fn issue(&self, user_id: UserId) -> Result<SessionToken, AuthError> {
        let mut bytes = [0u8; SessionToken::BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = SessionToken::from_random_bytes(&bytes);

        let mut tx = self.store.begin().await?;
        tx.set_session_token(user_id, &token).await?;
        tx.commit().await?;

        Ok(token)
    }

    /// Resolve the user behind an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` if no token was presented.
    /// Returns `AuthError::InvalidToken` if it matches no current session.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<User, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = SessionToken::from_authorization_header(header).map_err(|e| match e {
            TokenError::Missing => AuthError::MissingToken,
            TokenError::Malformed => AuthError::InvalidToken,
        })?;

        let mut tx = self.store.begin().await?;
        tx.find_user_by_token(&token)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}
