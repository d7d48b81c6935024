// src/db/engine.rs - Database engine: pool lifecycle and session factory

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::pool::{open_pool, PoolOptions, PoolStats};
use super::schema;
use super::session::SqliteSession;
use crate::infra::errors::StoreError;
use crate::session::{SessionFactory, SessionRef};

/// Owns the connection pool for one database file and opens sessions on it.
///
/// Created disconnected. `connect` builds the pool and runs migrations;
/// `disconnect` tears it down. Opening a session while disconnected is a
/// contract violation (`StoreError::NotConnected`).
pub struct Database {
    path: PathBuf,
    pool: RwLock<Option<SqlitePool>>,
    next_session: AtomicU64,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pool: RwLock::new(None),
            next_session: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the pool and bring the schema up to date. Reconnecting an
    /// already connected engine replaces its pool.
    pub async fn connect(&self, options: PoolOptions) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = open_pool(&self.path, &options).await?;
        let applied = match schema::run_migrations(&pool).await {
            Ok(applied) => applied,
            Err(e) => {
                pool.close().await;
                return Err(e);
            }
        };

        let stats = PoolStats::of(&pool);
        let old = self.slot_mut().replace(pool);
        if let Some(old) = old {
            old.close().await;
        }
        tracing::info!(
            "Database ready at {} ({} migration(s) applied, pool {})",
            self.path.display(),
            applied,
            stats
        );
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to come back.
    /// Safe to call when not connected.
    pub async fn disconnect(&self) {
        let pool = self.slot_mut().take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Database disconnected ({})", self.path.display());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.current_pool().is_some()
    }

    /// Run a trivial query on a pooled connection.
    pub async fn ping(&self) -> bool {
        let Some(pool) = self.current_pool() else {
            return false;
        };
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&pool)
            .await
        {
            Ok(one) => one == 1,
            Err(e) => {
                tracing::warn!("Database ping failed: {}", e);
                false
            }
        }
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.current_pool().map(|pool| PoolStats::of(&pool))
    }

    fn current_pool(&self) -> Option<SqlitePool> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn slot_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<SqlitePool>> {
        self.pool.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionFactory for Database {
    async fn open_session(&self) -> Result<SessionRef, StoreError> {
        let pool = self.current_pool().ok_or(StoreError::NotConnected)?;
        let tx = pool.begin().await?;
        let id = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Opened session {} ({})", id, PoolStats::of(&pool));
        Ok(Arc::new(SqliteSession::new(id, tx)))
    }
}
