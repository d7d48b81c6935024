// src/cli/migrate.rs - Database migration command
//
// Migrations run automatically when the service starts; this command shows
// where the schema stands, applies pending migrations, or reverts the latest.

use sqlx::SqlitePool;
use std::path::Path;

use crate::db::pool::{open_pool, PoolOptions};
use crate::db::schema;
use crate::infra::config::Config;

/// Show migration status, run pending migrations, or roll back the latest.
pub async fn run_migrate(
    config: &Config,
    status_only: bool,
    rollback: bool,
) -> anyhow::Result<()> {
    let db_path = config.database.db_path();

    if !db_path.exists() && (status_only || rollback) {
        println!("No database found at: {}", db_path.display());
        println!("Run `matcalc migrate` or start the service to create it.");
        return Ok(());
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // A single connection is enough for schema work
    let options = PoolOptions {
        pool_size: 1,
        max_overflow: 0,
        ..PoolOptions::from(&config.database)
    };
    let pool = open_pool(&db_path, &options).await?;

    let result = if status_only {
        show_migration_status(&pool, &db_path).await
    } else if rollback {
        run_rollback(&pool).await
    } else {
        println!("Running database migrations...");
        match schema::run_migrations(&pool).await {
            Ok(_) => {
                println!("Migrations complete.");
                show_migration_status(&pool, &db_path).await
            }
            Err(e) => Err(e.into()),
        }
    };

    pool.close().await;
    result
}

async fn show_migration_status(pool: &SqlitePool, db_path: &Path) -> anyhow::Result<()> {
    let applied = schema::applied_migrations(pool).await?;

    println!("Database: {}", db_path.display());
    println!(
        "Schema version: {} (latest known: {})",
        applied.last().map_or(0, |m| m.version),
        schema::latest_version()
    );
    println!();

    if applied.is_empty() {
        println!("No migrations have been run yet.");
        return Ok(());
    }

    println!("Applied migrations:");
    for m in &applied {
        println!(
            "  v{}: {} (applied {})",
            m.version, m.description, m.installed_on
        );
    }
    Ok(())
}

async fn run_rollback(pool: &SqlitePool) -> anyhow::Result<()> {
    match schema::rollback_latest(pool).await? {
        Some(version) => {
            println!("Rolled back migration v{}.", version);
            println!("Run `matcalc migrate --status` to verify.");
        }
        None => println!("No migrations to roll back."),
    }
    Ok(())
}
