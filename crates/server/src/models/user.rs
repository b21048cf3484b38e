//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartwheel_core::{SessionToken, UserId, Username};

/// A registered shopper.
///
/// Never carries the password hash or session token, so it is safe to
/// serialize directly into responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user record last changed (including logins).
    pub updated_at: DateTime<Utc>,
}

/// Body returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: SessionToken,
    /// The authenticated user.
    pub user: User,
}
