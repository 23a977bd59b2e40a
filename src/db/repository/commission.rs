use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::CommissionStatus;
use crate::models::CommissionEntry;

const ENTRY_COLUMNS: &str =
    "id, order_id, doctor_id, total_bill_amount, commission_percentage,
     calculated_amount, transaction_date, status";

pub fn insert_entry(conn: &Connection, entry: &CommissionEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO commission_ledger (id, order_id, doctor_id, total_bill_amount,
         commission_percentage, calculated_amount, transaction_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.order_id.to_string(),
            entry.doctor_id.to_string(),
            entry.total_bill_amount,
            entry.commission_percentage,
            entry.calculated_amount,
            entry.transaction_date.to_string(),
            entry.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_entry_for_order(conn: &Connection, order_id: &Uuid) -> Result<Option<CommissionEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM commission_ledger WHERE order_id = ?1"
    ))?;

    let result = stmt.query_row(params![order_id.to_string()], entry_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(entry_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A doctor's commission entries, newest first, optionally filtered by
/// settlement status.
pub fn list_entries_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
    status: Option<CommissionStatus>,
) -> Result<Vec<CommissionEntry>, DatabaseError> {
    let mut entries = Vec::new();
    match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM commission_ledger
                 WHERE doctor_id = ?1 AND status = ?2 ORDER BY transaction_date DESC"
            ))?;
            let rows = stmt.query_map(
                params![doctor_id.to_string(), status.as_str()],
                |row| Ok(entry_row_from_rusqlite(row)),
            )?;
            for row in rows {
                entries.push(entry_from_row(row??)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM commission_ledger
                 WHERE doctor_id = ?1 ORDER BY transaction_date DESC"
            ))?;
            let rows = stmt.query_map(params![doctor_id.to_string()], |row| {
                Ok(entry_row_from_rusqlite(row))
            })?;
            for row in rows {
                entries.push(entry_from_row(row??)?);
            }
        }
    }
    Ok(entries)
}

/// Sum of unpaid commission per doctor. Doctors with nothing unpaid are
/// absent from the map.
pub fn unpaid_totals_by_doctor(conn: &Connection) -> Result<Vec<(Uuid, f64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT doctor_id, SUM(calculated_amount) FROM commission_ledger
         WHERE status = 'UNPAID' GROUP BY doctor_id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut totals = Vec::new();
    for row in rows {
        let (doctor_id, total) = row?;
        let doctor_id = Uuid::parse_str(&doctor_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
        totals.push((doctor_id, total));
    }
    Ok(totals)
}

/// Flip every UNPAID entry for the doctor to PAID. Returns the number of
/// entries settled; zero is a legal no-op.
pub fn settle_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE commission_ledger SET status = 'PAID'
         WHERE doctor_id = ?1 AND status = 'UNPAID'",
        params![doctor_id.to_string()],
    )?;
    Ok(updated)
}

struct EntryRow {
    id: String,
    order_id: String,
    doctor_id: String,
    total_bill_amount: f64,
    commission_percentage: f64,
    calculated_amount: f64,
    transaction_date: String,
    status: String,
}

fn entry_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<EntryRow, rusqlite::Error> {
    Ok(EntryRow {
        id: row.get(0)?,
        order_id: row.get(1)?,
        doctor_id: row.get(2)?,
        total_bill_amount: row.get(3)?,
        commission_percentage: row.get(4)?,
        calculated_amount: row.get(5)?,
        transaction_date: row.get(6)?,
        status: row.get(7)?,
    })
}

fn entry_from_row(row: EntryRow) -> Result<CommissionEntry, DatabaseError> {
    Ok(CommissionEntry {
        id: parse_uuid(&row.id)?,
        order_id: parse_uuid(&row.order_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        total_bill_amount: row.total_bill_amount,
        commission_percentage: row.commission_percentage,
        calculated_amount: row.calculated_amount,
        transaction_date: NaiveDate::parse_from_str(&row.transaction_date, "%Y-%m-%d")
            .unwrap_or_default(),
        status: CommissionStatus::from_str(&row.status)?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::doctor::insert_doctor;
    use crate::db::repository::order::insert_order;
    use crate::db::repository::patient::insert_patient;
    use crate::models::enums::OrderStatus;
    use crate::models::{Doctor, LabOrder, Patient};

    fn seed_order_and_doctor(conn: &Connection) -> (Uuid, Uuid) {
        let patient = Patient {
            id: Uuid::new_v4(),
            mrn: "300-400".to_string(),
            name: "P".to_string(),
            age: 1,
            gender: "Male".to_string(),
            cnic: None,
            mobile: None,
            city: None,
            registered_at: chrono::Utc::now().naive_utc(),
        };
        insert_patient(conn, &patient).unwrap();

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Sana".to_string(),
            clinic: None,
            mobile: None,
            commission_percentage: 10.0,
        };
        insert_doctor(conn, &doctor).unwrap();

        let order = LabOrder {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: Some(doctor.id),
            order_date: chrono::Utc::now().naive_utc(),
            status: OrderStatus::Pending,
            total_amount: 2000.0,
            discount_amount: 0.0,
            paid_amount: 0.0,
            balance_due: 2000.0,
            report_delivered: false,
            delivery_date: None,
            results: vec![],
        };
        insert_order(conn, &order).unwrap();
        (order.id, doctor.id)
    }

    fn sample_entry(order_id: Uuid, doctor_id: Uuid) -> CommissionEntry {
        CommissionEntry {
            id: Uuid::new_v4(),
            order_id,
            doctor_id,
            total_bill_amount: 2000.0,
            commission_percentage: 10.0,
            calculated_amount: 200.0,
            transaction_date: chrono::Utc::now().date_naive(),
            status: CommissionStatus::Unpaid,
        }
    }

    #[test]
    fn one_entry_per_order() {
        let conn = open_memory_database().unwrap();
        let (order_id, doctor_id) = seed_order_and_doctor(&conn);

        insert_entry(&conn, &sample_entry(order_id, doctor_id)).unwrap();
        // order_id is UNIQUE — a second posting for the same order fails.
        assert!(insert_entry(&conn, &sample_entry(order_id, doctor_id)).is_err());
    }

    #[test]
    fn settle_flips_unpaid_and_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let (order_id, doctor_id) = seed_order_and_doctor(&conn);
        insert_entry(&conn, &sample_entry(order_id, doctor_id)).unwrap();

        assert_eq!(settle_doctor(&conn, &doctor_id).unwrap(), 1);
        assert_eq!(settle_doctor(&conn, &doctor_id).unwrap(), 0);

        let paid =
            list_entries_for_doctor(&conn, &doctor_id, Some(CommissionStatus::Paid)).unwrap();
        assert_eq!(paid.len(), 1);
        let all = list_entries_for_doctor(&conn, &doctor_id, None).unwrap();
        assert_eq!(all.len(), 1);
        assert!(unpaid_totals_by_doctor(&conn).unwrap().is_empty());
    }

    #[test]
    fn unpaid_totals_sum_per_doctor() {
        let conn = open_memory_database().unwrap();
        let (order_id, doctor_id) = seed_order_and_doctor(&conn);
        insert_entry(&conn, &sample_entry(order_id, doctor_id)).unwrap();

        let totals = unpaid_totals_by_doctor(&conn).unwrap();
        assert_eq!(totals, vec![(doctor_id, 200.0)]);
    }
}
