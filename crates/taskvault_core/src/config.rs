//! Runtime configuration resolution.
//!
//! # Responsibility
//! - Resolve database path, log directory and log level from the
//!   environment, falling back to per-user data directories.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolved paths are absolute when a platform data dir exists.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TASKVAULT_DB_PATH";
pub const LOG_DIR_ENV: &str = "TASKVAULT_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "TASKVAULT_LOG_LEVEL";

const APP_DIR_NAME: &str = "taskvault";
const DB_FILE_NAME: &str = "taskvault.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, which maps an env var name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let data_dir = default_data_dir();

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(DB_FILE_NAME)),
            log_dir: non_blank(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("logs")),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DB_PATH_ENV, LOG_LEVEL_ENV};
    use std::path::PathBuf;

    #[test]
    fn env_values_override_defaults() {
        let config = AppConfig::from_lookup(|key| match key {
            DB_PATH_ENV => Some("/tmp/tv/custom.sqlite3".to_string()),
            LOG_LEVEL_ENV => Some(" warn ".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/tmp/tv/custom.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.ends_with("taskvault/logs"));
    }

    #[test]
    fn blank_values_fall_back() {
        let config = AppConfig::from_lookup(|_| Some("   ".to_string()));
        assert!(config.db_path.ends_with("taskvault/taskvault.sqlite3"));
    }
}
