// src/session/mod.rs - Units of work against the store
//
// A session is one transaction on one pooled connection. `SessionManager`
// decides who owns it, `SessionContext` makes it visible to everything
// running in the same call chain, and `transactional` wraps an operation so
// that it runs inside exactly one session.

pub mod context;
pub mod manager;
pub mod transaction;

use async_trait::async_trait;
use std::sync::Arc;

use crate::infra::errors::StoreError;

pub use context::{ContextToken, SessionContext};
pub use manager::SessionManager;
pub use transaction::{operation, transactional, Operation};

/// A dynamically typed SQLite value, used for statement parameters and
/// result columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row, column values in select order.
pub type Row = Vec<Value>;

/// Shared handle to a live session.
pub type SessionRef = Arc<dyn Session>;

#[async_trait]
pub trait Session: Send + Sync {
    /// Process-unique id, for logs.
    fn id(&self) -> u64;

    /// Run a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<usize, StoreError>;

    /// Run a statement and return its first row, if any.
    async fn fetch_optional(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<Row>, StoreError>;

    async fn commit(&self) -> Result<(), StoreError>;

    async fn rollback(&self) -> Result<(), StoreError>;

    /// Release the underlying connection. Idempotent.
    async fn close(&self) -> Result<(), StoreError>;
}

/// Creates fresh sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> Result<SessionRef, StoreError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fakes for lifecycle assertions.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    pub type EventLog = Arc<Mutex<Vec<String>>>;

    #[derive(Default, Clone)]
    pub struct Behaviour {
        pub fail_commit: bool,
        pub fail_rollback: bool,
        pub fail_open: bool,
    }

    pub struct RecordingSession {
        id: u64,
        log: EventLog,
        behaviour: Behaviour,
        rows: Mutex<VecDeque<Option<Row>>>,
    }

    impl RecordingSession {
        pub fn new(id: u64, log: EventLog, behaviour: Behaviour) -> Self {
            Self {
                id,
                log,
                behaviour,
                rows: Mutex::new(VecDeque::new()),
            }
        }

        /// Queue the result of the next `fetch_optional`.
        pub fn push_row(&self, row: Option<Row>) {
            self.rows.lock().unwrap().push_back(row);
        }

        fn record(&self, event: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.id));
        }
    }

    #[async_trait]
    impl Session for RecordingSession {
        fn id(&self) -> u64 {
            self.id
        }

        async fn execute(&self, _sql: &str, _params: Vec<Value>) -> Result<usize, StoreError> {
            self.record("execute");
            Ok(1)
        }

        async fn fetch_optional(
            &self,
            _sql: &str,
            _params: Vec<Value>,
        ) -> Result<Option<Row>, StoreError> {
            self.record("fetch");
            Ok(self.rows.lock().unwrap().pop_front().flatten())
        }

        async fn commit(&self) -> Result<(), StoreError> {
            self.record("commit");
            if self.behaviour.fail_commit {
                return Err(StoreError::InvalidRow("commit refused".into()));
            }
            Ok(())
        }

        async fn rollback(&self) -> Result<(), StoreError> {
            self.record("rollback");
            if self.behaviour.fail_rollback {
                return Err(StoreError::InvalidRow("rollback refused".into()));
            }
            Ok(())
        }

        async fn close(&self) -> Result<(), StoreError> {
            self.record("close");
            Ok(())
        }
    }

    /// Hands out `RecordingSession`s and keeps them for inspection.
    #[derive(Default)]
    pub struct RecordingFactory {
        pub log: EventLog,
        pub behaviour: Behaviour,
        next_id: AtomicU64,
        opened: Mutex<Vec<Arc<RecordingSession>>>,
        rows: Mutex<Vec<Option<Row>>>,
    }

    impl RecordingFactory {
        pub fn with_behaviour(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                ..Default::default()
            }
        }

        /// Every session opened from now on starts with these queued rows.
        pub fn with_rows(self, rows: Vec<Option<Row>>) -> Self {
            *self.rows.lock().unwrap() = rows;
            self
        }

        pub fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        pub fn opened(&self) -> Vec<Arc<RecordingSession>> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionFactory for RecordingFactory {
        async fn open_session(&self) -> Result<SessionRef, StoreError> {
            if self.behaviour.fail_open {
                return Err(StoreError::NotConnected);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let session = Arc::new(RecordingSession::new(
                id,
                Arc::clone(&self.log),
                self.behaviour.clone(),
            ));
            for row in self.rows.lock().unwrap().iter() {
                session.push_row(row.clone());
            }
            self.log.lock().unwrap().push(format!("open:{id}"));
            self.opened.lock().unwrap().push(Arc::clone(&session));
            Ok(session)
        }
    }
}
