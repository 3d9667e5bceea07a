//! Runtime configuration and process bootstrap.
//!
//! # Responsibility
//! - Resolve database path and logging settings from defaults and env.
//! - Bring a process to a ready store: logging, migrations, seed data.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Bootstrap seeds relation types on every call; seeding is idempotent.

use crate::db::{open_db, DbError};
use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::repo::RepoError;
use crate::service::relation_types::seed_relation_types;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TOUTDOUX_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TOUTDOUX_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TOUTDOUX_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "toutdoux.sqlite3";

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Rolling log directory. Logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `TOUTDOUX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = non_blank(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_blank(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        config.log_dir = non_blank(LOG_DIR_ENV).map(PathBuf::from);
        config
    }
}

/// Bootstrap failure.
#[derive(Debug)]
pub enum BootstrapError {
    Logging(LoggingError),
    Db(DbError),
    Seed(RepoError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging bootstrap failed: {err}"),
            Self::Db(err) => write!(f, "database bootstrap failed: {err}"),
            Self::Seed(err) => write!(f, "relation type seeding failed: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Seed(err) => Some(err),
        }
    }
}

/// Initializes logging (when configured), opens the store and seeds it.
pub fn bootstrap(config: &CoreConfig) -> Result<Connection, BootstrapError> {
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(BootstrapError::Logging)?;
    }

    let mut conn = open_db(&config.db_path).map_err(BootstrapError::Db)?;
    seed_relation_types(&mut conn).map_err(BootstrapError::Seed)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::{bootstrap, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn lookup_overrides_defaults_and_ignores_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (DB_PATH_ENV, " /var/lib/toutdoux/db.sqlite3 "),
            (LOG_LEVEL_ENV, "   "),
            (LOG_DIR_ENV, "/var/log/toutdoux"),
        ]);
        let config = CoreConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/var/lib/toutdoux/db.sqlite3"));
        assert_eq!(config.log_level, CoreConfig::default().log_level);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/toutdoux")));
    }

    #[test]
    fn bootstrap_opens_and_seeds_file_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = CoreConfig {
            db_path: dir.path().join("bootstrap.sqlite3"),
            log_dir: None,
            ..CoreConfig::default()
        };

        let conn = bootstrap(&config).expect("bootstrap should succeed");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM todo_entry_relation_types;", [], |row| {
                row.get(0)
            })
            .expect("count relation types");
        assert_eq!(count, 5);
        drop(conn);

        let again = bootstrap(&config).expect("second bootstrap should succeed");
        let count: i64 = again
            .query_row("SELECT COUNT(*) FROM todo_entry_relation_types;", [], |row| {
                row.get(0)
            })
            .expect("count relation types");
        assert_eq!(count, 5);
    }
}
