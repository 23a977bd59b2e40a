//! Patient registration: CNIC normalisation/uniqueness and MRN
//! assignment. The MRN is a random six-digit `NNN-NNN` string, drawn
//! until it is unique — short enough to read over the phone, unique
//! enough for a single lab.

use rand::Rng;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::patient as patient_repo;
use crate::db::DatabaseError;
use crate::models::Patient;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("A patient with this CNIC already exists")]
    DuplicateCnic,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub cnic: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
}

/// Register a patient, assigning a fresh unique MRN.
pub fn register_patient(
    conn: &Connection,
    request: &RegisterPatientRequest,
) -> Result<Patient, RegistrationError> {
    // Blank CNIC means "not provided" — store NULL so the unique index
    // doesn't trip over empty strings.
    let cnic = request
        .cnic
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if let Some(cnic) = &cnic {
        if patient_repo::exists_by_cnic(conn, cnic)? {
            return Err(RegistrationError::DuplicateCnic);
        }
    }

    let mrn = generate_unique_mrn(conn)?;

    let patient = Patient {
        id: Uuid::new_v4(),
        mrn,
        name: request.name.clone(),
        age: request.age,
        gender: request.gender.clone(),
        cnic,
        mobile: request.mobile.clone(),
        city: request.city.clone(),
        registered_at: chrono::Utc::now().naive_utc(),
    };
    patient_repo::insert_patient(conn, &patient)?;

    tracing::info!(mrn = %patient.mrn, "Patient registered");
    Ok(patient)
}

fn generate_unique_mrn(conn: &Connection) -> Result<String, DatabaseError> {
    loop {
        let mrn = generate_mrn();
        if !patient_repo::exists_by_mrn(conn, &mrn)? {
            return Ok(mrn);
        }
    }
}

/// A random MRN formatted as `NNN-NNN` (e.g. 852-304).
fn generate_mrn() -> String {
    let mut rng = rand::thread_rng();
    let first: u32 = rng.gen_range(0..1000);
    let second: u32 = rng.gen_range(0..1000);
    format!("{first:03}-{second:03}")
}
