// src/infra/errors.rs - Error types for matcalc

use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised by the storage layer: the engine, the connection pool,
/// sessions and repositories.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Connection pool timeout: no connection became available")]
    PoolTimeout,

    // Programming-contract violation, never retried
    #[error("Session factory is not initialised (database not connected)")]
    NotConnected,

    #[error("Session {id} is already closed")]
    SessionClosed { id: u64 },

    #[error("Insert did not return a row")]
    NoRowReturned,

    #[error("Unexpected row shape: {0}")]
    InvalidRow(String),

    #[error("Value {value} does not fit NUMERIC({precision},{scale})")]
    OutOfRange {
        value: String,
        precision: u32,
        scale: u32,
    },

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::PoolTimeout,
            // A closed pool means the engine was disconnected underneath us
            sqlx::Error::PoolClosed => StoreError::NotConnected,
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// Contract errors mean the process is wired wrong, not that storage
    /// misbehaved.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, StoreError::NotConnected)
    }
}

/// Errors surfaced by the calculation pipeline.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Total cost overflowed the decimal range")]
    Overflow,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CalcError {
    /// HTTP status the boundary answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CalcError::Validation(_) | CalcError::Overflow => StatusCode::UNPROCESSABLE_ENTITY,
            CalcError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CalcError::Validation("empty".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CalcError::Overflow.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CalcError::Store(StoreError::NoRowReturned).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_no_row_message() {
        assert_eq!(
            StoreError::NoRowReturned.to_string(),
            "Insert did not return a row"
        );
    }

    #[test]
    fn test_contract_violation() {
        assert!(StoreError::NotConnected.is_contract_violation());
        assert!(!StoreError::NoRowReturned.is_contract_violation());
        assert!(!StoreError::PoolTimeout.is_contract_violation());
    }

    #[test]
    fn test_pool_errors_map_to_store_variants() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::PoolTimeout
        ));
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_contract_violation());
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
