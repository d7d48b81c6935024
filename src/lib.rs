// src/lib.rs - Library root for matcalc

pub mod api;
pub mod cli;
pub mod db;
pub mod infra;
pub mod repository;
pub mod service;
pub mod session;
