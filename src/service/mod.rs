// src/service/mod.rs - Business operations

pub mod calc;

pub use calc::{total_cost, CalculationService, LineItem};
