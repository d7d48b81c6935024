// src/db/pool.rs - Connection pool settings for one SQLite file

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

use crate::infra::config::DatabaseConfig;
use crate::infra::errors::StoreError;

/// Sizing and lifetime rules for the pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Connections kept open for reuse.
    pub pool_size: usize,
    /// Extra connections opened under load; reaped once idle.
    pub max_overflow: usize,
    /// Longest wait for a free connection. Also used as SQLite's busy timeout.
    pub timeout: Duration,
    /// Connections older than this are reopened. Zero disables recycling.
    pub recycle: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for PoolOptions {
    fn from(cfg: &DatabaseConfig) -> Self {
        Self {
            pool_size: cfg.pool_size,
            max_overflow: cfg.max_overflow,
            timeout: cfg.pool_timeout(),
            recycle: cfg.pool_recycle(),
        }
    }
}

impl PoolOptions {
    pub fn capacity(&self) -> usize {
        (self.pool_size + self.max_overflow).max(1)
    }

    fn connect_options(&self, path: &Path) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(self.timeout)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let capacity = self.capacity();
        SqlitePoolOptions::new()
            .max_connections(capacity as u32)
            .min_connections(self.pool_size.min(capacity) as u32)
            .acquire_timeout(self.timeout)
            .max_lifetime((!self.recycle.is_zero()).then_some(self.recycle))
    }
}

/// Open a pool on `path`, creating the file if needed.
pub(crate) async fn open_pool(
    path: &Path,
    options: &PoolOptions,
) -> Result<SqlitePool, StoreError> {
    let pool = options
        .pool_options()
        .connect_with(options.connect_options(path))
        .await?;
    Ok(pool)
}

/// Connection pool statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub open_connections: usize,
    pub idle_connections: usize,
    pub capacity: usize,
}

impl PoolStats {
    pub(crate) fn of(pool: &SqlitePool) -> Self {
        Self {
            open_connections: pool.size() as usize,
            idle_connections: pool.num_idle(),
            capacity: pool.options().get_max_connections() as usize,
        }
    }
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} open ({} idle), capacity {}",
            self.open_connections, self.idle_connections, self.capacity
        )
    }
}
