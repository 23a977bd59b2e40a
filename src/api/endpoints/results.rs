//! Single-result entry endpoint (legacy path, flat min/max only).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::LabResult;
use crate::results;

#[derive(Deserialize)]
pub struct EnterResultRequest {
    pub result_id: Uuid,
    pub value: String,
}

/// `POST /api/results/enter` — update one result against the test's
/// flat range, without touching order status or audit stamps.
pub async fn enter(
    State(ctx): State<ApiContext>,
    Json(request): Json<EnterResultRequest>,
) -> Result<Json<LabResult>, ApiError> {
    let conn = ctx.core.open_db()?;
    let result = results::enter_single_result(&conn, &request.result_id, &request.value)?;
    Ok(Json(result))
}
