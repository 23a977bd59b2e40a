//! Referring doctor directory endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::doctor as doctor_repo;
use crate::models::Doctor;

#[derive(Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub clinic: Option<String>,
    pub mobile: Option<String>,
    #[serde(default)]
    pub commission_percentage: f64,
}

/// `POST /api/doctors` — add a referring doctor with a commission rate.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<NewDoctor>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Doctor name is required".into()));
    }
    if !(0.0..=100.0).contains(&request.commission_percentage) {
        return Err(ApiError::BadRequest(
            "Commission percentage must be between 0 and 100".into(),
        ));
    }

    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: request.name,
        clinic: request.clinic,
        mobile: request.mobile,
        commission_percentage: request.commission_percentage,
    };

    let conn = ctx.core.open_db()?;
    doctor_repo::insert_doctor(&conn, &doctor)?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// `GET /api/doctors`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Doctor>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctors = doctor_repo::list_doctors(&conn)?;
    Ok(Json(doctors))
}
