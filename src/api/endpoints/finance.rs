//! Finance endpoints: commission settlement and daily closing.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{commission as commission_repo, doctor as doctor_repo};
use crate::finance::{self, DailyClosing, DoctorBalance};
use crate::models::{CommissionEntry, CommissionStatus};
use std::str::FromStr;

#[derive(Deserialize)]
pub struct ClosingQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct SettlementResponse {
    pub doctor_id: Uuid,
    pub entries_settled: usize,
}

/// `GET /api/finance/commissions` — unpaid balance per doctor.
pub async fn commissions(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<DoctorBalance>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let balances = finance::unpaid_balances(&conn)?;
    Ok(Json(balances))
}

#[derive(Deserialize)]
pub struct LedgerQuery {
    pub status: Option<String>,
}

/// `GET /api/finance/commissions/:doctor_id?status=` — the doctor's
/// commission ledger, newest first, paid and unpaid alike unless
/// filtered.
pub async fn ledger(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<CommissionEntry>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(s) => Some(CommissionStatus::from_str(s).map_err(|_| {
            ApiError::BadRequest(format!("Unknown commission status: {s}"))
        })?),
        None => None,
    };

    let conn = ctx.core.open_db()?;
    if doctor_repo::get_doctor(&conn, &doctor_id)?.is_none() {
        return Err(ApiError::NotFound(format!("Doctor {doctor_id} not found")));
    }
    let entries = commission_repo::list_entries_for_doctor(&conn, &doctor_id, status)?;
    Ok(Json(entries))
}

/// `POST /api/finance/commissions/:doctor_id/pay` — settle every
/// unpaid entry for the doctor in one sweep. Safe to repeat.
pub async fn pay(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    if doctor_repo::get_doctor(&conn, &doctor_id)?.is_none() {
        return Err(ApiError::NotFound(format!("Doctor {doctor_id} not found")));
    }

    let entries_settled = finance::mark_doctor_paid(&conn, &doctor_id)?;
    tracing::info!(%doctor_id, entries_settled, "Settled doctor commissions");
    Ok(Json(SettlementResponse {
        doctor_id,
        entries_settled,
    }))
}

/// `GET /api/finance/daily?date=` — cash position for one day.
/// Orders are stamped in UTC, so "today" defaults to the UTC day.
pub async fn daily(
    State(ctx): State<ApiContext>,
    Query(query): Query<ClosingQuery>,
) -> Result<Json<DailyClosing>, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let conn = ctx.core.open_db()?;
    let closing = finance::daily_closing(&conn, date)?;
    Ok(Json(closing))
}
