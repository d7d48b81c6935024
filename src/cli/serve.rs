// src/cli/serve.rs - Run the HTTP service

use anyhow::Context;
use std::future::Future;
use std::sync::Arc;

use crate::api;
use crate::db::{Database, PoolOptions};
use crate::infra::config::Config;

/// Serve until Ctrl-C.
pub async fn run_serve(config: &Config) -> anyhow::Result<()> {
    serve_until(config, shutdown_signal()).await
}

/// Connect the database, serve until `shutdown` resolves, then disconnect.
pub async fn serve_until<S>(config: &Config, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let db_path = config.database.db_path();
    let db = Arc::new(Database::new(&db_path));
    db.connect(PoolOptions::from(&config.database))
        .await
        .with_context(|| format!("Failed to connect to database at {}", db_path.display()))?;
    if db.ping().await {
        tracing::info!("Database answers at {}", db_path.display());
    } else {
        tracing::warn!("Database at {} did not answer a ping", db_path.display());
    }

    let state = api::app_state(db.clone());
    let result = api::start_server(&config.app, state, shutdown).await;

    db.disconnect().await;
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!("Cannot listen for Ctrl-C ({}); running until killed", e);
            std::future::pending::<()>().await;
        }
    }
}
