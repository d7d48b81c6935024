// src/db/schema.rs - Schema + migrations

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::infra::errors::StoreError;

/// Reversible migrations under `src/db/migrations`, tracked by sqlx in
/// `_sqlx_migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("src/db/migrations");

/// One applied row of `_sqlx_migrations`.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub installed_on: String,
}

/// Latest version known to this binary.
pub fn latest_version() -> i64 {
    MIGRATOR.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Run all pending migrations, each in its own transaction. Returns how
/// many were applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, StoreError> {
    let before = applied_migrations(pool).await?.len();
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await?.len();
    Ok(after.saturating_sub(before))
}

/// Revert the most recently applied migration. Returns the version rolled
/// back, or `None` when nothing is applied.
pub async fn rollback_latest(pool: &SqlitePool) -> Result<Option<i64>, StoreError> {
    let applied = applied_migrations(pool).await?;
    let Some(latest) = applied.last() else {
        return Ok(None);
    };
    let target = applied.iter().rev().nth(1).map_or(0, |m| m.version);

    info!(
        "Rolling back migration {}: {}",
        latest.version, latest.description
    );
    MIGRATOR.undo(pool, target).await?;
    Ok(Some(latest.version))
}

pub async fn applied_migrations(pool: &SqlitePool) -> Result<Vec<AppliedMigration>, StoreError> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok(Vec::new());
    }

    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT version, description, CAST(installed_on AS TEXT) \
         FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(version, description, installed_on)| AppliedMigration {
            version,
            description,
            installed_on,
        })
        .collect())
}
