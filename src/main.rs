// src/main.rs - matcalc entry point

use clap::Parser;
use std::path::Path;

use matcalc::cli::{Cli, Commands};
use matcalc::infra::config::Config;
use matcalc::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Variables already set in the environment win over the file
    let env_path = Path::new(&cli.env_file);
    if env_path.exists() {
        dotenv::from_path(env_path)?;
    } else {
        eprintln!(
            "note: env file {} not found, using process environment",
            env_path.display()
        );
    }

    // Load config (falls back to defaults if no config.toml)
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(Path::new(path))?,
        None => Config::load()?,
    };
    config.apply_env()?;
    if let Some(host) = cli.host {
        config.app.host = host;
    }
    if let Some(port) = cli.port {
        config.app.port = port;
    }

    logger::init_logging(&config.app.log_level, config.app.log_format);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => matcalc::cli::serve::run_serve(&config).await,
        Commands::Migrate { status, rollback } => {
            matcalc::cli::migrate::run_migrate(&config, status, rollback).await
        }
    }
}
