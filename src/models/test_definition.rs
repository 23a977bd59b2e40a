use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RuleGender;

/// A test in the lab's catalog.
///
/// `min_range`/`max_range` are the legacy flat reference range kept for
/// tests without age/gender rules; the resolver falls back to them when
/// no `ReferenceRange` rule matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: Uuid,
    pub test_name: String,
    pub short_code: Option<String>,
    pub price: f64,
    pub unit: Option<String>,
    pub department: Option<String>,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
}

/// One age/gender reference-range rule for a test.
///
/// Rules are evaluated in `position` order and the first match wins, so
/// overlapping windows are legal and their stored order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub id: Uuid,
    pub test_id: Uuid,
    pub gender: RuleGender,
    pub min_age: i64,
    pub max_age: i64,
    pub min_val: f64,
    pub max_val: f64,
    pub position: i64,
}

/// One recipe line: the quantity of an inventory item consumed each time
/// the test is performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConsumption {
    pub id: Uuid,
    pub test_id: Uuid,
    pub item_id: Uuid,
    pub quantity: f64,
}
