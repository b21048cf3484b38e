//! User queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use cartwheel_core::{SessionToken, UserId, Username};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the username already exists.
/// Returns `RepositoryError::Database` for other database errors.
pub(super) async fn insert(
    conn: &mut PgConnection,
    username: &Username,
    password_hash: &str,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO shop.users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, created_at, updated_at
        ",
    )
    .bind(username.as_str())
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "username already exists"))?;

    row.try_into()
}

/// Get a user and their password hash by username.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
pub(super) async fn find_credentials(
    conn: &mut PgConnection,
    username: &Username,
) -> Result<Option<(User, String)>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialRow>(
        r"
        SELECT id, username, password_hash, created_at, updated_at
        FROM shop.users
        WHERE username = $1
        ",
    )
    .bind(username.as_str())
    .fetch_optional(conn)
    .await?;

    match row {
        Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
        None => Ok(None),
    }
}

/// Replace a user's session token, invalidating the previous one.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
/// Returns `RepositoryError::Database` if the query fails.
pub(super) async fn set_session_token(
    conn: &mut PgConnection,
    user_id: UserId,
    token: &SessionToken,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop.users
        SET session_token = $2, updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(user_id)
    .bind(token.as_str())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Get the user currently holding a session token.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(super) async fn find_by_token(
    conn: &mut PgConnection,
    token: &SessionToken,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, username, created_at, updated_at
        FROM shop.users
        WHERE session_token = $1
        ",
    )
    .bind(token.as_str())
    .fetch_optional(conn)
    .await?;

    row.map(User::try_from).transpose()
}

/// List all users.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub(super) async fn list(conn: &mut PgConnection) -> Result<Vec<User>, RepositoryError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, username, created_at, updated_at
        FROM shop.users
        ORDER BY id
        ",
    )
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Lock the user row until the surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
/// Returns `RepositoryError::Database` if the query fails.
pub(super) async fn lock(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, UserId>(
        r"
        SELECT id FROM shop.users
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .map(|_| ())
    .ok_or(RepositoryError::NotFound)
}
