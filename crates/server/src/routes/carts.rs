//! Cart routes. Both require a session token.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use cartwheel_core::ItemId;

use super::json::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::CartManager;
use crate::state::AppState;

/// Body of `POST /carts`.
#[derive(Deserialize)]
pub struct AddItemRequest {
    pub item_id: ItemId,
    /// Absent, zero, or negative means one.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// `POST /carts`: add an item to the caller's active cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id, item_id = %body.item_id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<Cart>> {
    let cart = CartManager::new(state.store())
        .add_item(user.id, body.item_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// `GET /carts`: every cart the caller has owned.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Cart>>> {
    Ok(Json(CartManager::new(state.store()).list_carts(user.id).await?))
}
