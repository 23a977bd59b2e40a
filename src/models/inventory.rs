use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A consumable stock item. Stock is a real number so liquid reagents
/// can be tracked in fractional units (e.g. 12.5 ml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_name: String,
    pub current_stock: f64,
    /// Reorder alert boundary. Informational only — never blocks booking.
    pub min_threshold: Option<f64>,
    pub unit: Option<String>,
}
