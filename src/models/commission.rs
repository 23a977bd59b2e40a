use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::CommissionStatus;

/// One commission ledger entry, posted at most once per order (only when
/// a referring doctor with a non-zero rate is attached). Bill amount and
/// rate are snapshots taken at posting time; later changes to the order
/// or the doctor's rate never touch existing entries. Only `status`
/// transitions after insert (UNPAID -> PAID, in bulk per doctor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub doctor_id: Uuid,
    pub total_bill_amount: f64,
    pub commission_percentage: f64,
    pub calculated_amount: f64,
    pub transaction_date: NaiveDate,
    pub status: CommissionStatus,
}
