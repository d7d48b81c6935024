// src/api/types.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::infra::errors::CalcError;
use crate::repository::CalcResult;
use crate::service::LineItem;

/// Body returned for every 500, whatever went wrong underneath.
pub const INTERNAL_ERROR_DETAIL: &str = "internal service error";

/// Request body for `POST /calc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcRequest {
    pub materials: Vec<LineItem>,
}

impl CalcRequest {
    /// Reject requests the calculation should never see.
    pub fn validate(&self) -> Result<(), CalcError> {
        let invalid = |reason: String| Err(CalcError::Validation(reason));
        if self.materials.is_empty() {
            return invalid("materials must contain at least one item".into());
        }
        for (i, item) in self.materials.iter().enumerate() {
            if item.name.trim().is_empty() {
                return invalid(format!("materials[{i}].name must not be empty"));
            }
            if item.qty <= Decimal::ZERO {
                return invalid(format!("materials[{i}].qty must be greater than 0"));
            }
            if item.price_rub <= Decimal::ZERO {
                return invalid(format!("materials[{i}].price_rub must be greater than 0"));
            }
        }
        Ok(())
    }
}

/// Response for a stored calculation. `total_cost_rub` serializes as a
/// string with two fractional digits.
#[derive(Debug, Serialize, Deserialize)]
pub struct CalcResponse {
    pub id: i64,
    pub total_cost_rub: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<CalcResult> for CalcResponse {
    fn from(result: CalcResult) -> Self {
        Self {
            id: result.id,
            total_cost_rub: result.total_cost_rub,
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!(error = %err, "Calculation failed");
            return Self {
                status,
                detail: INTERNAL_ERROR_DETAIL.into(),
            };
        }
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}
