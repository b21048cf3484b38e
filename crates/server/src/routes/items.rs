//! Catalog routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use cartwheel_core::ItemId;

use super::json::ApiJson;
use crate::error::{AppError, Result};
use crate::models::Item;
use crate::services::Catalog;
use crate::state::AppState;

/// Body of `POST /items`. `price` may be a JSON string or number.
#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

/// `POST /items`
#[instrument(skip(state, body), fields(name = %body.name))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = Catalog::new(state.store())
        .create_item(&body.name, &body.description, body.price)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    Ok(Json(Catalog::new(state.store()).list_items().await?))
}

/// `GET /items/{id}`
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Item>> {
    // Anything that is not an item ID names no item.
    let id = id
        .parse::<ItemId>()
        .map_err(|_| AppError::NotFound("Item not found".to_string()))?;
    Ok(Json(Catalog::new(state.store()).get_item(id).await?))
}
