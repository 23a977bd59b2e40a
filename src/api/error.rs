//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::booking::OrderError;
use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::inventory::StockError;
use crate::registration::RegistrationError;
use crate::results::ResultError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Out of stock: {0}")]
    OutOfStock(String),
    #[error("Order locked: {0}")]
    OrderLocked(String),
    #[error("Payment due: {0}")]
    PaymentDue(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::OutOfStock(detail) => (StatusCode::BAD_REQUEST, "OUT_OF_STOCK", detail.clone()),
            ApiError::OrderLocked(detail) => (StatusCode::CONFLICT, "ORDER_LOCKED", detail.clone()),
            ApiError::PaymentDue(detail) => {
                (StatusCode::PAYMENT_REQUIRED, "PAYMENT_DUE", detail.clone())
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DatabaseError::InvalidEnum { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::PatientNotFound(_) | OrderError::TestNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderError::OutOfStock { .. } => ApiError::OutOfStock(err.to_string()),
            OrderError::Database(e) => e.into(),
        }
    }
}

impl From<ResultError> for ApiError {
    fn from(err: ResultError) -> Self {
        match err {
            ResultError::ResultNotFound(_) | ResultError::OrderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ResultError::LockedOrder => ApiError::OrderLocked(err.to_string()),
            ResultError::PaymentDue { .. } => ApiError::PaymentDue(err.to_string()),
            ResultError::Database(e) => e.into(),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::DuplicateCnic => ApiError::Conflict(err.to_string()),
            RegistrationError::Database(e) => e.into(),
        }
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ItemNotFound(_) => ApiError::NotFound(err.to_string()),
            StockError::Insufficient { .. } => ApiError::OutOfStock(err.to_string()),
            StockError::Database(e) => e.into(),
        }
    }
}
