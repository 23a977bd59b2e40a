use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered patient. Identified to staff by MRN (medical record
/// number), a unique `NNN-NNN` digit string assigned at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub mrn: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    /// National identity number; unique when present, blank input is
    /// normalised to `None` at registration.
    pub cnic: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub registered_at: NaiveDateTime,
}
