use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A referring doctor. `commission_percentage` of 0 disables commission
/// posting for their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub clinic: Option<String>,
    pub mobile: Option<String>,
    pub commission_percentage: f64,
}
