use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str =
    "id, mrn, name, age, gender, cnic, mobile, city, registered_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, mrn, name, age, gender, cnic, mobile, city, registered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            patient.id.to_string(),
            patient.mrn,
            patient.name,
            patient.age,
            patient.gender,
            patient.cnic,
            patient.mobile,
            patient.city,
            patient.registered_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], patient_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Patients matching an MRN or name fragment; all patients for an empty
/// query. Newest registrations first.
pub fn search_patients(conn: &Connection, query: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{query}%");
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE mrn LIKE ?1 OR LOWER(name) LIKE LOWER(?1)
         ORDER BY registered_at DESC"
    ))?;

    let rows = stmt.query_map(params![pattern], |row| Ok(patient_row_from_rusqlite(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

pub fn exists_by_mrn(conn: &Connection, mrn: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE mrn = ?1",
        params![mrn],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn exists_by_cnic(conn: &Connection, cnic: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE cnic = ?1",
        params![cnic],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// Internal row type for Patient mapping
struct PatientRow {
    id: String,
    mrn: String,
    name: String,
    age: i64,
    gender: String,
    cnic: Option<String>,
    mobile: Option<String>,
    city: Option<String>,
    registered_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        mrn: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        gender: row.get(4)?,
        cnic: row.get(5)?,
        mobile: row.get(6)?,
        city: row.get(7)?,
        registered_at: row.get(8)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        mrn: row.mrn,
        name: row.name,
        age: row.age,
        gender: row.gender,
        cnic: row.cnic,
        mobile: row.mobile,
        city: row.city,
        registered_at: NaiveDateTime::parse_from_str(&row.registered_at, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&row.registered_at, "%Y-%m-%dT%H:%M:%S"))
            .unwrap_or_default(),
    })
}
