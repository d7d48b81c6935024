// src/db/session.rs - SQLite-backed session

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row as _, Sqlite, Transaction, TypeInfo, ValueRef};
use tokio::sync::Mutex;

use crate::infra::errors::StoreError;
use crate::session::{Row, Session, Value};

/// One transaction on one pooled connection.
///
/// Commit, rollback and close each end the transaction; after that every
/// statement fails with `SessionClosed`. Dropping a session that still holds
/// its transaction rolls it back and returns the connection to the pool.
pub struct SqliteSession {
    id: u64,
    tx: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteSession {
    pub fn new(id: u64, tx: Transaction<'static, Sqlite>) -> Self {
        Self {
            id,
            tx: Mutex::new(Some(tx)),
        }
    }

    async fn finish(&self) -> Option<Transaction<'static, Sqlite>> {
        self.tx.lock().await.take()
    }
}

fn bind_all(sql: &str, params: Vec<Value>) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    params
        .into_iter()
        .fold(sqlx::query(sql), |query, param| match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(n) => query.bind(n),
            Value::Real(x) => query.bind(x),
            Value::Text(s) => query.bind(s),
            Value::Blob(b) => query.bind(b),
        })
}

/// Copy a result row out by each value's storage class.
fn decode_row(row: &SqliteRow) -> Result<Row, StoreError> {
    (0..row.len())
        .map(|i| -> Result<Value, StoreError> {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Value::Null);
            }
            let value = match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked(i)?),
                "REAL" => Value::Real(row.try_get_unchecked(i)?),
                "BLOB" => Value::Blob(row.try_get_unchecked(i)?),
                _ => Value::Text(row.try_get_unchecked(i)?),
            };
            Ok(value)
        })
        .collect()
}

#[async_trait]
impl Session for SqliteSession {
    fn id(&self) -> u64 {
        self.id
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<usize, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or(StoreError::SessionClosed { id: self.id })?;
        let done = bind_all(sql, params).execute(&mut **tx).await?;
        Ok(done.rows_affected() as usize)
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<Row>, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or(StoreError::SessionClosed { id: self.id })?;
        let row = bind_all(sql, params).fetch_optional(&mut **tx).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn commit(&self) -> Result<(), StoreError> {
        if let Some(tx) = self.finish().await {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        if let Some(tx) = self.finish().await {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        // Anything not committed by now is discarded
        if let Some(tx) = self.finish().await {
            tx.rollback().await?;
        }
        Ok(())
    }
}
