//! Inventory ledger: guarded stock deduction and the low-stock feed.
//!
//! `deduct` is the only mutation path used by order booking. It runs on
//! the caller's connection so a surrounding transaction can roll the
//! decrement back together with the rest of the order.

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::inventory as inventory_repo;
use crate::db::DatabaseError;
use crate::models::InventoryItem;

#[derive(Error, Debug)]
pub enum StockError {
    #[error("Inventory item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Out of stock: requires {needed} {unit} of '{item}', but only {available} is available")]
    Insufficient {
        item: String,
        needed: f64,
        available: f64,
        unit: String,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Deduct `quantity` from an item's stock.
///
/// Fails when the request exceeds what is on hand; draining stock to
/// exactly zero is allowed. Returns the new stock level.
pub fn deduct(conn: &Connection, item_id: &Uuid, quantity: f64) -> Result<f64, StockError> {
    let item = inventory_repo::get_item(conn, item_id)?
        .ok_or(StockError::ItemNotFound(*item_id))?;

    if item.current_stock < quantity {
        return Err(StockError::Insufficient {
            item: item.item_name,
            needed: quantity,
            available: item.current_stock,
            unit: item.unit.unwrap_or_default(),
        });
    }

    let new_stock = item.current_stock - quantity;
    inventory_repo::set_stock(conn, item_id, new_stock)?;

    tracing::debug!(
        item = %item.item_name,
        deducted = quantity,
        remaining = new_stock,
        "Stock deducted"
    );
    Ok(new_stock)
}

/// Items at or below their reorder threshold (informational alert feed).
pub fn low_stock(conn: &Connection) -> Result<Vec<InventoryItem>, StockError> {
    Ok(inventory_repo::list_low_stock(conn)?)
}
