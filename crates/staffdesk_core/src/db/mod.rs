//! Record store access.
//!
//! # Responsibility
//! - Hand out configured SQLite connections with the schema up to date.
//! - Classify storage failures for the layers above.
//!
//! # Invariants
//! - Connections returned from `open_db*` enforce foreign keys; departments,
//!   employees and the association tables rely on them for referential
//!   integrity.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database file was written by a newer schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A schema step failed and the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// UNIQUE, CHECK and FOREIGN KEY rejections.
    pub fn is_constraint_violation(&self) -> bool {
        let sqlite = match self {
            Self::Sqlite(err) => err,
            Self::Migration { source, .. } => source,
            Self::UnsupportedSchemaVersion { .. } => return false,
        };
        matches!(
            sqlite.sqlite_error_code(),
            Some(ErrorCode::ConstraintViolation)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than this build supports ({latest_supported})"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "schema step {version} `{name}` failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
