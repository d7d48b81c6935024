// src/api/handlers.rs

use crate::api::{types::*, ApiState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::infra::errors::CalcError;

/// POST /calc - Sum the materials and store the total in one transaction.
pub async fn calc(
    State(state): State<ApiState>,
    body: Result<Json<CalcRequest>, JsonRejection>,
) -> Result<Json<CalcResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(e) => ApiError {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            detail: e.body_text(),
        },
        other => ApiError::from(CalcError::Validation(other.body_text())),
    })?;
    req.validate()?;

    let result = (state.calculate)(req.materials).await?;
    Ok(Json(CalcResponse::from(result)))
}

/// GET /health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        time: chrono::Utc::now(),
    })
}
