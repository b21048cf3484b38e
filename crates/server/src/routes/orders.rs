//! Checkout and order history. Both require a session token.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use cartwheel_core::CartId;

use super::json::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::CheckoutEngine;
use crate::state::AppState;

/// Body of `POST /orders`.
#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub cart_id: CartId,
}

/// `POST /orders`: check out one of the caller's carts.
#[instrument(skip(state, user, body), fields(user_id = %user.id, cart_id = %body.cart_id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutEngine::new(state.store())
        .checkout(user.id, body.cart_id)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        CheckoutEngine::new(state.store()).list_orders(user.id).await?,
    ))
}
