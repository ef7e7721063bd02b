//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one CRUD contract shared by every entity table.
//! - Isolate SQLite query details from service and HTTP orchestration.
//!
//! # Invariants
//! - Repository writes validate their input before persistence.
//! - `get_by_id`/`delete` report an absent row as `None`, not as an error.
//! - Every mutating call is a single transactional unit.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod department_repo;
pub mod employee_repo;
pub mod project_repo;
pub mod role_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Referenced row does not exist for an operation that requires it.
    NotFound { entity: &'static str, id: EntityId },
    /// Persisted row cannot be decoded into its domain record.
    InvalidData(String),
    /// Write succeeded but read-back did not return the row.
    InconsistentState(&'static str),
}

impl RepoError {
    /// Returns whether the store rejected the write on a constraint
    /// (duplicate name/email, dangling foreign key, department still in use).
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Db(err) => err.is_constraint_violation(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// CRUD contract instantiated once per entity table.
pub trait Repository {
    /// Fully populated record returned by reads.
    type Entity;
    /// Validated input accepted by `create`.
    type NewEntity;

    /// Returns every row ordered by id.
    fn get_all(&self) -> RepoResult<Vec<Self::Entity>>;
    /// Looks up one row by primary key.
    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<Self::Entity>>;
    /// Inserts one row and returns it with generated id and defaults.
    fn create(&self, input: &Self::NewEntity) -> RepoResult<Self::Entity>;
    /// Removes one row and returns its prior state, or `None` if absent.
    fn delete(&self, id: EntityId) -> RepoResult<Option<Self::Entity>>;
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(table_column: &str, value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {table_column}"
        ))),
    }
}
