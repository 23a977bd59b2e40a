//! Result entry: single-result updates, the technician's worklist batch
//! save, and the report-delivery lock.
//!
//! The batch save is the only path that flips an order to COMPLETED —
//! saving the worklist form is taken as "the order is done", even when
//! some slots are still blank. Once a report is delivered no result on
//! that order can be modified again.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{order as order_repo, patient as patient_repo,
    test_definition as test_repo};
use crate::db::DatabaseError;
use crate::models::enums::OrderStatus;
use crate::models::{LabOrder, LabResult};
use crate::ranges::{self, Classification};

#[derive(Error, Debug)]
pub enum ResultError {
    #[error("Result not found: {0}")]
    ResultNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Cannot modify results after report delivery")]
    LockedOrder,

    #[error("Payment required: {balance_due} is still due on this order")]
    PaymentDue { balance_due: f64 },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ResultError {
    fn from(err: rusqlite::Error) -> Self {
        ResultError::Database(DatabaseError::Sqlite(err))
    }
}

/// One value submitted from the worklist screen.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultEntry {
    pub result_id: Uuid,
    pub value: String,
}

/// Update a single result (legacy path): the value is checked against
/// the test's flat min/max only, ignoring age/gender rules. Non-numeric
/// values clear the abnormal flag and leave the remark alone.
pub fn enter_single_result(
    conn: &Connection,
    result_id: &Uuid,
    value: &str,
) -> Result<LabResult, ResultError> {
    let mut result = order_repo::get_result(conn, result_id)?
        .ok_or(ResultError::ResultNotFound(*result_id))?;
    let test = test_repo::get_test_definition(conn, &result.test_id)?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "TestDefinition".into(),
            id: result.test_id.to_string(),
        })?;

    result.result_value = value.to_string();

    match value.trim().parse::<f64>() {
        Ok(numeric) => {
            if let (Some(min), Some(max)) = (test.min_range, test.max_range) {
                let classification = if numeric < min {
                    Classification::Low
                } else if numeric > max {
                    Classification::High
                } else {
                    Classification::Normal
                };
                result.is_abnormal = classification.is_abnormal();
                result.remarks = classification.remark().to_string();
            }
        }
        Err(_) => {
            // Text results ("Positive") carry no range check.
            result.is_abnormal = false;
        }
    }

    order_repo::update_result(conn, &result)?;
    Ok(result)
}

/// Save the worklist form for an order, as `operator`.
///
/// Rejected outright when the report was already delivered. Each entry
/// reloads the authoritative row by id — client-supplied relations are
/// never trusted. Non-empty values stamp the audit trail and are
/// classified against the patient's age/gender reference ranges. The
/// order is then marked COMPLETED unconditionally. The whole save is one
/// transaction.
pub fn save_batch(
    conn: &mut Connection,
    order_id: &Uuid,
    entries: &[ResultEntry],
    operator: &str,
) -> Result<LabOrder, ResultError> {
    let tx = conn.transaction()?;

    let order = order_repo::get_order(&tx, order_id)?
        .ok_or(ResultError::OrderNotFound(*order_id))?;
    if order.report_delivered {
        return Err(ResultError::LockedOrder);
    }

    let patient = patient_repo::get_patient(&tx, &order.patient_id)?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: order.patient_id.to_string(),
        })?;

    let now = chrono::Utc::now().naive_utc();
    for entry in entries {
        save_one(&tx, entry, &patient.gender, patient.age, operator, now)?;
    }

    order_repo::update_order_status(&tx, order_id, OrderStatus::Completed)?;
    tx.commit()?;

    tracing::info!(
        order_id = %order_id,
        results = entries.len(),
        operator,
        "Worklist saved, order completed"
    );

    let saved = order_repo::get_order(conn, order_id)?
        .ok_or(ResultError::OrderNotFound(*order_id))?;
    Ok(saved)
}

fn save_one(
    conn: &Connection,
    entry: &ResultEntry,
    patient_gender: &str,
    patient_age: i64,
    operator: &str,
    now: NaiveDateTime,
) -> Result<(), ResultError> {
    let mut result = order_repo::get_result(conn, &entry.result_id)?
        .ok_or(ResultError::ResultNotFound(entry.result_id))?;

    result.result_value = entry.value.clone();

    if !entry.value.is_empty() {
        result.performed_by = Some(operator.to_string());
        result.performed_at = Some(now);

        let test = test_repo::get_test_definition(conn, &result.test_id)?
            .ok_or_else(|| DatabaseError::NotFound {
                entity_type: "TestDefinition".into(),
                id: result.test_id.to_string(),
            })?;
        let rules = test_repo::get_ranges_for_test(conn, &result.test_id)?;

        let classification =
            ranges::classify(&test, &rules, patient_gender, patient_age, &entry.value);
        result.is_abnormal = classification.is_abnormal();
        result.remarks = classification.remark().to_string();
    }
    // Blank values leave flags and audit stamps untouched.

    order_repo::update_result(conn, &result)?;
    Ok(())
}

/// Hand the printed report to the patient. After this the order is
/// locked against result entry.
///
/// The counter never releases a report while money is owed: any
/// outstanding balance must be collected first.
pub fn deliver_report(conn: &Connection, order_id: &Uuid) -> Result<LabOrder, ResultError> {
    let order = order_repo::get_order(conn, order_id)?
        .ok_or(ResultError::OrderNotFound(*order_id))?;
    if !order.report_delivered {
        if order.balance_due > 0.0 {
            return Err(ResultError::PaymentDue {
                balance_due: order.balance_due,
            });
        }
        order_repo::mark_delivered(conn, order_id, chrono::Utc::now().naive_utc())?;
    }
    let delivered = order_repo::get_order(conn, order_id)?
        .ok_or(ResultError::OrderNotFound(*order_id))?;
    Ok(delivered)
}
