//! Server configuration loaded from the process environment.
//!
//! # Invariants
//! - Blank variables fall back to their defaults.
//! - `log_dir` is always absolute; relative values resolve against the
//!   working directory.

use staffdesk_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};

pub const BIND_ENV: &str = "STAFFDESK_HTTP_BIND";
pub const DB_PATH_ENV: &str = "STAFFDESK_DB_PATH";
pub const QUERY_STORE_PATH_ENV: &str = "STAFFDESK_QUERY_STORE_PATH";
pub const LOG_LEVEL_ENV: &str = "STAFFDESK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STAFFDESK_LOG_DIR";

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_DB_PATH: &str = "staffdesk.sqlite3";
const DEFAULT_QUERY_STORE_PATH: &str = "saved_queries.json";
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub query_store_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBind {
        value: String,
        source: AddrParseError,
    },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBind { value, source } => {
                write!(f, "invalid {BIND_ENV} value `{value}`: {source}")
            }
            Self::CurrentDir(err) => write!(f, "failed to resolve working directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBind { source, .. } => Some(source),
            Self::CurrentDir(err) => Some(err),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let bind_text = value(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_text.clone(),
                source,
            })?;

        let log_dir = value(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let log_dir = if log_dir.is_absolute() {
            log_dir
        } else {
            cwd.join(log_dir)
        };

        Ok(Self {
            bind,
            db_path: value(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            query_store_path: value(QUERY_STORE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUERY_STORE_PATH)),
            log_level: value(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig, BIND_ENV, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), Path::new("/srv/staffdesk"))
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = load(&[]).expect("defaults should load");
        assert_eq!(config.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(config.db_path, PathBuf::from("staffdesk.sqlite3"));
        assert_eq!(config.query_store_path, PathBuf::from("saved_queries.json"));
        assert_eq!(config.log_dir, PathBuf::from("/srv/staffdesk/logs"));
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            (BIND_ENV, "0.0.0.0:9000"),
            (DB_PATH_ENV, " /data/staff.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/staffdesk"),
        ])
        .expect("config should load");
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/data/staff.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/staffdesk"));
    }

    #[test]
    fn blank_values_fall_back_and_bad_bind_is_rejected() {
        let config = load(&[(DB_PATH_ENV, "   ")]).expect("config should load");
        assert_eq!(config.db_path, PathBuf::from("staffdesk.sqlite3"));

        let err = load(&[(BIND_ENV, "localhost")]).expect_err("bind must be host:port");
        assert!(err.to_string().contains(BIND_ENV));
    }
}
