//! Order booking and worklist endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::{self, OrderRequest};
use crate::db::repository::order as order_repo;
use crate::finance;
use crate::models::{LabOrder, OrderStatus};
use crate::results::{self, ResultEntry};

#[derive(Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct SaveResultsRequest {
    pub operator: String,
    pub results: Vec<ResultEntry>,
}

/// `POST /api/orders` — book an order: price the tests, create result
/// slots, deduct consumables and post commission, all in one
/// transaction. Fails whole if any test's recipe cannot be covered.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<LabOrder>), ApiError> {
    if request.test_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "An order must contain at least one test".into(),
        ));
    }

    let mut conn = ctx.core.open_db()?;
    let order = booking::create_order(&mut conn, &request)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders?status=` — worklist, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<LabOrder>>, ApiError> {
    let status = match filter.status.as_deref() {
        Some(s) => Some(
            OrderStatus::from_str(s)
                .map_err(|_| ApiError::BadRequest(format!("Unknown order status: {s}")))?,
        ),
        None => None,
    };

    let conn = ctx.core.open_db()?;
    let orders = order_repo::list_orders(&conn, status)?;
    Ok(Json(orders))
}

/// `GET /api/orders/:id` — order with its result rows.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LabOrder>, ApiError> {
    let conn = ctx.core.open_db()?;
    let order = order_repo::get_order(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order))
}

/// `POST /api/orders/:id/results` — save the worklist form.
///
/// Rejected with 409 once the report has been delivered.
pub async fn save_results(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SaveResultsRequest>,
) -> Result<Json<LabOrder>, ApiError> {
    if request.operator.trim().is_empty() {
        return Err(ApiError::BadRequest("Operator name is required".into()));
    }

    let mut conn = ctx.core.open_db()?;
    let order = results::save_batch(&mut conn, &id, &request.results, &request.operator)?;
    Ok(Json(order))
}

/// `POST /api/orders/:id/pay` — collect cash against the outstanding
/// balance after booking.
pub async fn pay(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<LabOrder>, ApiError> {
    if request.amount <= 0.0 {
        return Err(ApiError::BadRequest("Payment amount must be positive".into()));
    }

    let conn = ctx.core.open_db()?;
    let order = finance::collect_payment(&conn, &id, request.amount)?;
    Ok(Json(order))
}

/// `POST /api/orders/:id/deliver` — hand over the printed report and
/// lock the order against further edits. Refused while a balance is
/// still due.
pub async fn deliver(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LabOrder>, ApiError> {
    let conn = ctx.core.open_db()?;
    let order = results::deliver_report(&conn, &id)?;
    Ok(Json(order))
}
