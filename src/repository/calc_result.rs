// src/repository/calc_result.rs - calc_results table access

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;

use crate::infra::errors::StoreError;
use crate::session::{Row, SessionManager, Value};

/// Total digits and fractional digits of the stored amount.
pub const TOTAL_PRECISION: u32 = 12;
pub const TOTAL_SCALE: u32 = 2;

const INSERT_SQL: &str = "INSERT INTO calc_results (total_cost_rub) VALUES (?1) \
                          RETURNING id, total_cost_rub, created_at";

/// A persisted calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcResult {
    pub id: i64,
    pub total_cost_rub: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalcResultStore: Send + Sync {
    /// Insert one result row; the store assigns `id` and `created_at`.
    async fn insert(&self, total_cost_rub: Decimal) -> Result<CalcResult, StoreError>;
}

/// Writes results through whatever session is ambient, opening its own
/// only when called outside a unit of work.
#[derive(Clone)]
pub struct CalcResultRepository {
    sessions: SessionManager,
}

impl CalcResultRepository {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl CalcResultStore for CalcResultRepository {
    async fn insert(&self, total_cost_rub: Decimal) -> Result<CalcResult, StoreError> {
        let stored = to_column_scale(total_cost_rub)?;
        let param = Value::Text(stored.to_string());

        self.sessions
            .acquire(|session| async move {
                let row = session
                    .fetch_optional(INSERT_SQL, vec![param])
                    .await?
                    .ok_or(StoreError::NoRowReturned)?;
                let result = parse_row(row)?;
                tracing::debug!(
                    session = session.id(),
                    id = result.id,
                    total = %result.total_cost_rub,
                    "Inserted calc result"
                );
                Ok::<_, StoreError>(result)
            })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to insert calc result"))
    }
}

/// Round half away from zero to two places and check the column bound.
fn to_column_scale(value: Decimal) -> Result<Decimal, StoreError> {
    let mut scaled =
        value.round_dp_with_strategy(TOTAL_SCALE, RoundingStrategy::MidpointAwayFromZero);
    scaled.rescale(TOTAL_SCALE);

    let limit = Decimal::from(10_i64.pow(TOTAL_PRECISION - TOTAL_SCALE));
    if scaled.abs() >= limit {
        return Err(StoreError::OutOfRange {
            value: scaled.to_string(),
            precision: TOTAL_PRECISION,
            scale: TOTAL_SCALE,
        });
    }
    Ok(scaled)
}

fn parse_row(row: Row) -> Result<CalcResult, StoreError> {
    let [id, total, created_at]: [Value; 3] = row
        .try_into()
        .map_err(|row: Row| {
            StoreError::InvalidRow(format!("expected 3 columns, got {}", row.len()))
        })?;

    let id = match id {
        Value::Integer(id) => id,
        other => return Err(StoreError::InvalidRow(format!("id is {other:?}"))),
    };

    let mut total_cost_rub = match total {
        Value::Text(ref text) => Decimal::from_str(text)
            .map_err(|e| StoreError::InvalidRow(format!("total_cost_rub '{text}': {e}")))?,
        Value::Integer(n) => Decimal::from(n),
        other => return Err(StoreError::InvalidRow(format!("total_cost_rub is {other:?}"))),
    };
    total_cost_rub.rescale(TOTAL_SCALE);

    let created_at = match created_at {
        Value::Text(ref text) => DateTime::parse_from_rfc3339(text)
            .map_err(|e| StoreError::InvalidRow(format!("created_at '{text}': {e}")))?
            .with_timezone(&Utc),
        other => return Err(StoreError::InvalidRow(format!("created_at is {other:?}"))),
    };

    Ok(CalcResult {
        id,
        total_cost_rub,
        created_at,
    })
}
