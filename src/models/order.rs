use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::OrderStatus;

/// A lab order: the aggregate root owning one `LabResult` slot per
/// ordered test. Order and results are always persisted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabOrder {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub discount_amount: f64,
    pub paid_amount: f64,
    pub balance_due: f64,
    /// Once set the order is immutable to result entry.
    pub report_delivered: bool,
    pub delivery_date: Option<NaiveDateTime>,
    pub results: Vec<LabResult>,
}

impl LabOrder {
    /// Recompute `balance_due` from the three billing inputs.
    /// Must hold after every mutation of any of them.
    pub fn recompute_balance(&mut self) {
        self.balance_due = self.total_amount - self.discount_amount - self.paid_amount;
    }
}

/// One result slot, created empty at booking time and filled in by the
/// lab technician during result entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub id: Uuid,
    pub order_id: Uuid,
    pub test_id: Uuid,
    /// Free text: numeric-as-text ("4.7") or qualitative ("Positive").
    pub result_value: String,
    pub is_abnormal: bool,
    pub remarks: String,
    pub performed_by: Option<String>,
    pub performed_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn balance_is_total_minus_discount_minus_paid() {
        let mut order = LabOrder {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: None,
            order_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            status: OrderStatus::Pending,
            total_amount: 800.0,
            discount_amount: 50.0,
            paid_amount: 200.0,
            balance_due: 0.0,
            report_delivered: false,
            delivery_date: None,
            results: vec![],
        };
        order.recompute_balance();
        assert_eq!(order.balance_due, 550.0);
    }
}
