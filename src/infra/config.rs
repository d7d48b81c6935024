// src/infra/config.rs - Configuration loading (TOML + environment overrides)

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Material cost calculator".into(),
            host: "0.0.0.0".into(),
            port: 8000,
            log_level: "info".into(),
            log_format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "compact" | "text" => Ok(LogFormat::Compact),
            other => anyhow::bail!("unknown log format '{other}' (expected json or compact)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `matcalc.db` in the data directory.
    pub path: Option<String>,
    /// Connections kept open for reuse.
    pub pool_size: usize,
    /// Extra connections allowed under load, closed once idle.
    pub max_overflow: usize,
    pub pool_timeout_secs: u64,
    /// Connections older than this are reopened instead of reused.
    pub pool_recycle_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 5,
            max_overflow: 10,
            pool_timeout_secs: 30,
            pool_recycle_secs: 1800,
        }
    }
}

impl DatabaseConfig {
    pub fn db_path(&self) -> PathBuf {
        match self.path {
            Some(ref p) => PathBuf::from(p),
            None => paths::db_path(),
        }
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    pub fn pool_recycle(&self) -> Duration {
        Duration::from_secs(self.pool_recycle_secs)
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `APP_*` / `DATABASE_*` / `DB_*` overrides from the process
    /// environment.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unset or blank keys are
    /// ignored; values that fail to parse are errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_TITLE") {
            self.app.title = v;
        }
        if let Some(v) = get("APP_HOST") {
            self.app.host = v;
        }
        if let Some(v) = get("APP_PORT") {
            self.app.port = parse_var("APP_PORT", &v)?;
        }
        if let Some(v) = get("APP_LOG_LEVEL") {
            self.app.log_level = v.to_lowercase();
        }
        if let Some(v) = get("APP_LOG_FORMAT") {
            self.app.log_format = v.parse()?;
        }
        if let Some(v) = get("DATABASE_PATH") {
            self.database.path = Some(v);
        }
        if let Some(v) = get("DB_POOL_SIZE") {
            self.database.pool_size = parse_var("DB_POOL_SIZE", &v)?;
        }
        if let Some(v) = get("DB_MAX_OVERFLOW") {
            self.database.max_overflow = parse_var("DB_MAX_OVERFLOW", &v)?;
        }
        if let Some(v) = get("DB_POOL_TIMEOUT") {
            self.database.pool_timeout_secs = parse_var("DB_POOL_TIMEOUT", &v)?;
        }
        if let Some(v) = get("DB_POOL_RECYCLE") {
            self.database.pool_recycle_secs = parse_var("DB_POOL_RECYCLE", &v)?;
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Configuration error: {key}={value:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.app.host, "0.0.0.0");
        assert_eq!(c.app.port, 8000);
        assert_eq!(c.app.log_format, LogFormat::Json);
        assert_eq!(c.database.pool_size, 5);
        assert_eq!(c.database.max_overflow, 10);
        assert_eq!(c.database.pool_timeout(), Duration::from_secs(30));
        assert_eq!(c.database.pool_recycle(), Duration::from_secs(1800));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.app.port, 8000);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_str = r#"
[app]
port = 9100
log_format = "compact"

[database]
path = "/tmp/calc.db"
pool_size = 2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.app.port, 9100);
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.log_format, LogFormat::Compact);
        assert_eq!(config.database.db_path(), PathBuf::from("/tmp/calc.db"));
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.database.max_overflow, 10);
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("APP_PORT", "8080"),
            ("APP_LOG_LEVEL", "DEBUG"),
            ("DATABASE_PATH", "/var/lib/matcalc/calc.db"),
            ("DB_POOL_SIZE", "3"),
            ("DB_POOL_RECYCLE", "60"),
            ("APP_HOST", "  "),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.database.path.as_deref(), Some("/var/lib/matcalc/calc.db"));
        assert_eq!(config.database.pool_size, 3);
        assert_eq!(config.database.pool_recycle_secs, 60);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let vars = env(&[("DB_POOL_TIMEOUT", "soon")]);
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| vars.get(k).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("DB_POOL_TIMEOUT"));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.app.port, config.app.port);
        assert_eq!(deserialized.database.pool_size, config.database.pool_size);
    }
}
