// src/infra/paths.rs - Config and data locations
//
// MATCALC_HOME overrides everything: config.toml lives directly in it and the
// database under $MATCALC_HOME/data. Otherwise the platform directories from
// `directories` are used, falling back to the working directory.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<Option<ProjectDirs>> = OnceLock::new();

fn project_dirs() -> Option<&'static ProjectDirs> {
    PROJECT_DIRS
        .get_or_init(|| ProjectDirs::from("", "", "matcalc"))
        .as_ref()
}

fn matcalc_home() -> Option<PathBuf> {
    std::env::var_os("MATCALC_HOME").map(PathBuf::from)
}

/// Configuration directory: $MATCALC_HOME/ or the platform config dir.
pub fn config_dir() -> PathBuf {
    if let Some(home) = matcalc_home() {
        return home;
    }
    project_dirs()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Data directory: $MATCALC_HOME/data/ or the platform local data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = matcalc_home() {
        return home.join("data");
    }
    project_dirs()
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default database path
pub fn db_path() -> PathBuf {
    data_dir().join("matcalc.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_under_data_dir() {
        let path = db_path();
        assert!(path.ends_with("matcalc.db"));
        assert_eq!(path.parent(), Some(data_dir().as_path()));
    }

    #[test]
    fn test_config_file_name() {
        assert!(config_file_path().ends_with("config.toml"));
    }
}
