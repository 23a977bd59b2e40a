use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Doctor;

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, name, clinic, mobile, commission_percentage)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.clinic,
            doctor.mobile,
            doctor.commission_percentage,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, clinic, mobile, commission_percentage FROM doctors WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], doctor_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(doctor_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, clinic, mobile, commission_percentage FROM doctors ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(doctor_row_from_rusqlite(row)))?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(doctor_from_row(row??)?);
    }
    Ok(doctors)
}

struct DoctorRow {
    id: String,
    name: String,
    clinic: Option<String>,
    mobile: Option<String>,
    commission_percentage: f64,
}

fn doctor_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoctorRow, rusqlite::Error> {
    Ok(DoctorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        clinic: row.get(2)?,
        mobile: row.get(3)?,
        commission_percentage: row.get(4)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        clinic: row.clinic,
        mobile: row.mobile,
        commission_percentage: row.commission_percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn insert_and_list() {
        let conn = open_memory_database().unwrap();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Bilal".to_string(),
            clinic: Some("City Clinic".to_string()),
            mobile: None,
            commission_percentage: 10.0,
        };
        insert_doctor(&conn, &doctor).unwrap();

        let doctors = list_doctors(&conn).unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].commission_percentage, 10.0);

        let loaded = get_doctor(&conn, &doctor.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Dr. Bilal");
    }

    #[test]
    fn missing_doctor_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_doctor(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
