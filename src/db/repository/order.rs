use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::OrderStatus;
use crate::models::{LabOrder, LabResult};

const ORDER_COLUMNS: &str =
    "id, patient_id, doctor_id, order_date, status, total_amount, discount_amount,
     paid_amount, balance_due, report_delivered, delivery_date";

const RESULT_COLUMNS: &str =
    "id, order_id, test_id, result_value, is_abnormal, remarks, performed_by, performed_at";

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Persist an order together with its result slots. The aggregate is
/// always written as a unit; callers wrap this in their transaction.
pub fn insert_order(conn: &Connection, order: &LabOrder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lab_orders (id, patient_id, doctor_id, order_date, status, total_amount,
         discount_amount, paid_amount, balance_due, report_delivered, delivery_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            order.id.to_string(),
            order.patient_id.to_string(),
            order.doctor_id.map(|id| id.to_string()),
            order.order_date.format(DATETIME_FMT).to_string(),
            order.status.as_str(),
            order.total_amount,
            order.discount_amount,
            order.paid_amount,
            order.balance_due,
            order.report_delivered as i32,
            order.delivery_date.map(|d| d.format(DATETIME_FMT).to_string()),
        ],
    )?;

    for result in &order.results {
        insert_result(conn, result)?;
    }
    Ok(())
}

pub fn insert_result(conn: &Connection, result: &LabResult) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lab_results (id, order_id, test_id, result_value, is_abnormal, remarks,
         performed_by, performed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            result.id.to_string(),
            result.order_id.to_string(),
            result.test_id.to_string(),
            result.result_value,
            result.is_abnormal as i32,
            result.remarks,
            result.performed_by,
            result.performed_at.map(|d| d.format(DATETIME_FMT).to_string()),
        ],
    )?;
    Ok(())
}

/// Load an order with its result slots.
pub fn get_order(conn: &Connection, id: &Uuid) -> Result<Option<LabOrder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM lab_orders WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], order_row_from_rusqlite);

    let row = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut order = order_from_row(row)?;
    order.results = get_results_for_order(conn, id)?;
    Ok(Some(order))
}

pub fn get_results_for_order(conn: &Connection, order_id: &Uuid) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESULT_COLUMNS} FROM lab_results WHERE order_id = ?1 ORDER BY rowid"
    ))?;

    let rows = stmt.query_map(params![order_id.to_string()], |row| Ok(result_row_from_rusqlite(row)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row??)?);
    }
    Ok(results)
}

pub fn get_result(conn: &Connection, id: &Uuid) -> Result<Option<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESULT_COLUMNS} FROM lab_results WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], result_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(result_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_result(conn: &Connection, result: &LabResult) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_results SET result_value = ?2, is_abnormal = ?3, remarks = ?4,
         performed_by = ?5, performed_at = ?6
         WHERE id = ?1",
        params![
            result.id.to_string(),
            result.result_value,
            result.is_abnormal as i32,
            result.remarks,
            result.performed_by,
            result.performed_at.map(|d| d.format(DATETIME_FMT).to_string()),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LabResult".into(),
            id: result.id.to_string(),
        });
    }
    Ok(())
}

pub fn update_order_status(conn: &Connection, id: &Uuid, status: OrderStatus) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_orders SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LabOrder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Rewrite the billing inputs, recomputing the balance in the same
/// statement so `balance_due = total - discount - paid` can never drift.
pub fn update_billing(conn: &Connection, id: &Uuid, discount: f64, paid: f64) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_orders
         SET discount_amount = ?2, paid_amount = ?3,
             balance_due = total_amount - ?2 - ?3
         WHERE id = ?1",
        params![id.to_string(), discount, paid],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LabOrder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn mark_delivered(conn: &Connection, id: &Uuid, when: NaiveDateTime) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_orders SET report_delivered = 1, delivery_date = ?2 WHERE id = ?1",
        params![id.to_string(), when.format(DATETIME_FMT).to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "LabOrder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Orders with the given status, or all orders when `status` is None.
/// Newest first. Result slots are not loaded for list views.
pub fn list_orders(conn: &Connection, status: Option<OrderStatus>) -> Result<Vec<LabOrder>, DatabaseError> {
    let mut orders = Vec::new();
    match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM lab_orders WHERE status = ?1 ORDER BY order_date DESC"
            ))?;
            let rows = stmt.query_map(params![status.as_str()], |row| Ok(order_row_from_rusqlite(row)))?;
            for row in rows {
                orders.push(order_from_row(row??)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM lab_orders ORDER BY order_date DESC"
            ))?;
            let rows = stmt.query_map([], |row| Ok(order_row_from_rusqlite(row)))?;
            for row in rows {
                orders.push(order_from_row(row??)?);
            }
        }
    }
    Ok(orders)
}

/// A patient's order history, newest first.
pub fn list_orders_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<LabOrder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM lab_orders WHERE patient_id = ?1 ORDER BY order_date DESC"
    ))?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| Ok(order_row_from_rusqlite(row)))?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(order_from_row(row??)?);
    }
    Ok(orders)
}

/// Orders created on the given calendar day (daily closing).
pub fn list_orders_on_date(conn: &Connection, date: NaiveDate) -> Result<Vec<LabOrder>, DatabaseError> {
    let day = date.format("%Y-%m-%d").to_string();
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM lab_orders WHERE date(order_date) = ?1 ORDER BY order_date"
    ))?;

    let rows = stmt.query_map(params![day], |row| Ok(order_row_from_rusqlite(row)))?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(order_from_row(row??)?);
    }
    Ok(orders)
}

// Internal row types

struct OrderRow {
    id: String,
    patient_id: String,
    doctor_id: Option<String>,
    order_date: String,
    status: String,
    total_amount: f64,
    discount_amount: f64,
    paid_amount: f64,
    balance_due: f64,
    report_delivered: i32,
    delivery_date: Option<String>,
}

fn order_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<OrderRow, rusqlite::Error> {
    Ok(OrderRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        order_date: row.get(3)?,
        status: row.get(4)?,
        total_amount: row.get(5)?,
        discount_amount: row.get(6)?,
        paid_amount: row.get(7)?,
        balance_due: row.get(8)?,
        report_delivered: row.get(9)?,
        delivery_date: row.get(10)?,
    })
}

fn order_from_row(row: OrderRow) -> Result<LabOrder, DatabaseError> {
    Ok(LabOrder {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: row.doctor_id.and_then(|s| Uuid::parse_str(&s).ok()),
        order_date: parse_datetime(&row.order_date),
        status: OrderStatus::from_str(&row.status)?,
        total_amount: row.total_amount,
        discount_amount: row.discount_amount,
        paid_amount: row.paid_amount,
        balance_due: row.balance_due,
        report_delivered: row.report_delivered != 0,
        delivery_date: row.delivery_date.map(|d| parse_datetime(&d)),
        results: Vec::new(),
    })
}

struct ResultRow {
    id: String,
    order_id: String,
    test_id: String,
    result_value: String,
    is_abnormal: i32,
    remarks: String,
    performed_by: Option<String>,
    performed_at: Option<String>,
}

fn result_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ResultRow, rusqlite::Error> {
    Ok(ResultRow {
        id: row.get(0)?,
        order_id: row.get(1)?,
        test_id: row.get(2)?,
        result_value: row.get(3)?,
        is_abnormal: row.get(4)?,
        remarks: row.get(5)?,
        performed_by: row.get(6)?,
        performed_at: row.get(7)?,
    })
}

fn result_from_row(row: ResultRow) -> Result<LabResult, DatabaseError> {
    Ok(LabResult {
        id: parse_uuid(&row.id)?,
        order_id: parse_uuid(&row.order_id)?,
        test_id: parse_uuid(&row.test_id)?,
        result_value: row.result_value,
        is_abnormal: row.is_abnormal != 0,
        remarks: row.remarks,
        performed_by: row.performed_by,
        performed_at: row.performed_at.map(|d| parse_datetime(&d)),
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}
