// src/service/calc.rs - Material cost calculation

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infra::errors::CalcError;
use crate::repository::{CalcResult, CalcResultStore};

/// One material in a calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    // JSON numbers are read digit for digit, never through f64
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub qty: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price_rub: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, qty: Decimal, price_rub: Decimal) -> Self {
        Self {
            name: name.into(),
            qty,
            price_rub,
        }
    }
}

/// Sum of `qty * price_rub`, exact, rounded half away from zero to kopecks.
/// An empty list costs `0.00`.
pub fn total_cost(items: &[LineItem]) -> Result<Decimal, CalcError> {
    let sum = items.iter().try_fold(Decimal::ZERO, |acc, item| {
        item.qty
            .checked_mul(item.price_rub)
            .and_then(|line| acc.checked_add(line))
            .ok_or(CalcError::Overflow)
    })?;

    let mut total = sum.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    total.rescale(2);
    Ok(total)
}

/// Computes totals and persists them.
#[derive(Clone)]
pub struct CalculationService {
    repository: Arc<dyn CalcResultStore>,
}

impl CalculationService {
    pub fn new(repository: Arc<dyn CalcResultStore>) -> Self {
        Self { repository }
    }

    /// Compute the total and store it. Store errors are returned as-is.
    pub async fn calculate_and_save(&self, items: &[LineItem]) -> Result<CalcResult, CalcError> {
        let total = total_cost(items)?;
        tracing::info!(items = items.len(), total = %total, "Calculated material cost");
        Ok(self.repository.insert(total).await?)
    }
}
