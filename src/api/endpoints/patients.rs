//! Patient registration and lookup endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{order as order_repo, patient as patient_repo};
use crate::models::{LabOrder, Patient};
use crate::registration::{self, RegisterPatientRequest};

#[derive(Deserialize)]
pub struct PatientSearch {
    pub query: Option<String>,
}

/// `POST /api/patients` — register a walk-in patient, assigning an MRN.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient name is required".into()));
    }

    let conn = ctx.core.open_db()?;
    let patient = registration::register_patient(&conn, &request)?;

    tracing::info!(mrn = %patient.mrn, "Registered patient");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients?query=` — search by name, MRN, CNIC or mobile.
pub async fn search(
    State(ctx): State<ApiContext>,
    Query(params): Query<PatientSearch>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let query = params.query.unwrap_or_default();
    let patients = patient_repo::search_patients(&conn, &query)?;
    Ok(Json(patients))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.core.open_db()?;
    let patient = patient_repo::get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Patient {id} not found")))?;
    Ok(Json(patient))
}

/// `GET /api/patients/:id/orders` — visit history, newest first.
pub async fn orders(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LabOrder>>, ApiError> {
    let conn = ctx.core.open_db()?;
    if patient_repo::get_patient(&conn, &id)?.is_none() {
        return Err(ApiError::NotFound(format!("Patient {id} not found")));
    }
    let orders = order_repo::list_orders_for_patient(&conn, &id)?;
    Ok(Json(orders))
}
