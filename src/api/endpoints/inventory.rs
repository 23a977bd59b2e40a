//! Inventory endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::inventory as inventory_repo;
use crate::models::InventoryItem;

#[derive(Deserialize)]
pub struct NewItem {
    pub item_name: String,
    #[serde(default)]
    pub current_stock: f64,
    pub min_threshold: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Deserialize)]
pub struct StockUpdate {
    pub current_stock: f64,
}

/// `POST /api/inventory` — add a consumable.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<NewItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    if request.item_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Item name is required".into()));
    }
    if request.current_stock < 0.0 {
        return Err(ApiError::BadRequest("Stock cannot be negative".into()));
    }

    let item = InventoryItem {
        id: Uuid::new_v4(),
        item_name: request.item_name,
        current_stock: request.current_stock,
        min_threshold: request.min_threshold,
        unit: request.unit,
    };

    let conn = ctx.core.open_db()?;
    inventory_repo::insert_item(&conn, &item)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /api/inventory`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let items = inventory_repo::list_items(&conn)?;
    Ok(Json(items))
}

/// `GET /api/inventory/low` — items at or below their reorder threshold.
pub async fn low(State(ctx): State<ApiContext>) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let items = crate::inventory::low_stock(&conn)?;
    Ok(Json(items))
}

/// `PUT /api/inventory/:id/stock` — restock or correct the level.
pub async fn set_stock(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<StockUpdate>,
) -> Result<Json<InventoryItem>, ApiError> {
    if request.current_stock < 0.0 {
        return Err(ApiError::BadRequest("Stock cannot be negative".into()));
    }

    let conn = ctx.core.open_db()?;
    inventory_repo::set_stock(&conn, &id, request.current_stock)?;
    let item = inventory_repo::get_item(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Inventory item {id} not found")))?;
    Ok(Json(item))
}
