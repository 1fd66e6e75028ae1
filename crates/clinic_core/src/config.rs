//! Runtime configuration for the clinic store.
//!
//! # Responsibility
//! - Resolve database location and logging options from the environment.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - `db_path = None` selects an in-memory database.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CLINIC_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CLINIC_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CLINIC_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "clinic.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    /// SQLite file location; `None` keeps the store in memory.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl ClinicConfig {
    /// Reads `CLINIC_DB_PATH`, `CLINIC_LOG_LEVEL` and `CLINIC_LOG_DIR`.
    ///
    /// Without `CLINIC_DB_PATH` the database lives in the system temp
    /// directory.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Ephemeral configuration with default logging.
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: Some(
                non_blank(DB_PATH_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            ),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
