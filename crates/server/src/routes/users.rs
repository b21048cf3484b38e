//! Registration, login, and user listing.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use super::json::ApiJson;
use crate::error::Result;
use crate::models::{LoginResponse, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Body of `POST /users` and `POST /users/login`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// `POST /users`
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.store())
        .register(&body.username, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /users/login`
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let session = AuthService::new(state.store())
        .login(&body.username, &body.password)
        .await?;
    Ok(Json(session))
}

/// `GET /users`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(AuthService::new(state.store()).list_users().await?))
}
