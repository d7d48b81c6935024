// src/repository/mod.rs - Persistence of calculation results

pub mod calc_result;

pub use calc_result::{CalcResult, CalcResultRepository, CalcResultStore};
