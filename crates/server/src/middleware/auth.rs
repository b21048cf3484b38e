//! Bearer-token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::{AuthError, SessionStore};
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// Reads the `Authorization` header (`Bearer <token>` or the bare token) and
/// resolves the user holding it. Rejects with 401 when the header is absent
/// or the token is unknown.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AppError::Auth(AuthError::InvalidToken))?,
            ),
            None => None,
        };

        let user = SessionStore::new(state.store())
            .authenticate(header)
            .await?;

        tracing::Span::current().record("user_id", user.id.as_i64());
        set_sentry_user(&user.id, Some(user.username.as_str()));

        Ok(Self(user))
    }
}
