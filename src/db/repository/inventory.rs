use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::InventoryItem;

const ITEM_COLUMNS: &str = "id, item_name, current_stock, min_threshold, unit";

pub fn insert_item(conn: &Connection, item: &InventoryItem) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO inventory_items (id, item_name, current_stock, min_threshold, unit)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.id.to_string(),
            item.item_name,
            item.current_stock,
            item.min_threshold,
            item.unit,
        ],
    )?;
    Ok(())
}

pub fn get_item(conn: &Connection, id: &Uuid) -> Result<Option<InventoryItem>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], item_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(item_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_items(conn: &Connection) -> Result<Vec<InventoryItem>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY item_name"
    ))?;

    let rows = stmt.query_map([], |row| Ok(item_row_from_rusqlite(row)))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(item_from_row(row??)?);
    }
    Ok(items)
}

/// Items at or below their reorder threshold.
pub fn list_low_stock(conn: &Connection) -> Result<Vec<InventoryItem>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM inventory_items
         WHERE min_threshold IS NOT NULL AND current_stock <= min_threshold
         ORDER BY item_name"
    ))?;

    let rows = stmt.query_map([], |row| Ok(item_row_from_rusqlite(row)))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(item_from_row(row??)?);
    }
    Ok(items)
}

/// Write a new absolute stock level. Guarding against underflow is the
/// caller's job (`inventory::deduct`).
pub fn set_stock(conn: &Connection, id: &Uuid, new_stock: f64) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE inventory_items SET current_stock = ?2 WHERE id = ?1",
        params![id.to_string(), new_stock],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "InventoryItem".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct ItemRow {
    id: String,
    item_name: String,
    current_stock: f64,
    min_threshold: Option<f64>,
    unit: Option<String>,
}

fn item_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ItemRow, rusqlite::Error> {
    Ok(ItemRow {
        id: row.get(0)?,
        item_name: row.get(1)?,
        current_stock: row.get(2)?,
        min_threshold: row.get(3)?,
        unit: row.get(4)?,
    })
}

fn item_from_row(row: ItemRow) -> Result<InventoryItem, DatabaseError> {
    Ok(InventoryItem {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        item_name: row.item_name,
        current_stock: row.current_stock,
        min_threshold: row.min_threshold,
        unit: row.unit,
    })
}
