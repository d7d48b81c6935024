// src/cli/mod.rs - CLI definition (clap derive)

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "matcalc", about = "Material cost calculator service", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// .env file to load before reading environment overrides
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: String,

    /// Bind address (overrides config and APP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides config and APP_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP service (default)
    Serve,
    /// Database migration management
    Migrate {
        /// Show migration status
        #[arg(long)]
        status: bool,
        /// Roll back the latest migration
        #[arg(long, conflicts_with = "status")]
        rollback: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["matcalc"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.env_file, ".env");
        assert!(cli.port.is_none());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::parse_from([
            "matcalc",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--env-file",
            "prod.env",
            "serve",
        ]);
        assert_eq!(cli.command, Some(Commands::Serve));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.env_file, "prod.env");
    }

    #[test]
    fn test_migrate_flags() {
        let cli = Cli::parse_from(["matcalc", "migrate", "--rollback", "--config", "c.toml"]);
        assert_eq!(
            cli.command,
            Some(Commands::Migrate {
                status: false,
                rollback: true
            })
        );
        assert_eq!(cli.config.as_deref(), Some("c.toml"));

        assert!(Cli::try_parse_from(["matcalc", "migrate", "--status", "--rollback"]).is_err());
    }
}
