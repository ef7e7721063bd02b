//! Ad-hoc query evaluation over the record store.
//!
//! # Responsibility
//! - Parse operator-supplied query lines written in a closed grammar.
//! - Compile parsed descriptors into parameterized, read-only SQL.
//! - Evaluate batches with per-line fault isolation and keep a result log.
//!
//! # Invariants
//! - Operator text is never executed as code or spliced into SQL: table and
//!   column names come from a fixed allow-list, literals are bound parameters.
//! - Compiled statements are always a single `SELECT`.
//! - One failing line never aborts the rest of its batch.
//!
//! # Grammar
//! ```text
//! query      := entity [where expr] [select item {, item}]
//!               [group by field] [order by field [asc|desc]] [limit n]
//! item       := field | count(*) | agg(field)      agg: count sum avg min max
//! expr       := expr or expr | expr and expr | not expr | ( expr )
//!             | field op value | field is [not] null
//!             | field [not] in (value {, value}) | field between value and value
//! op         := = == != <> < <= > >= like
//! value      := 12 | 1.5 | 'text' | true | false
//!             | today() | date('2024-01-31') | days_ago(30)
//! ```
//!
//! A filter nests `not` and parentheses at most `parser::MAX_EXPR_DEPTH`
//! deep and holds at most `parser::MAX_PREDICATES` comparisons.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod compile;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod result_log;
pub mod schema;

pub type QueryResult<T> = Result<T, QueryError>;

/// Failure while lexing, parsing, compiling or executing one query line.
#[derive(Debug)]
pub enum QueryError {
    /// Text does not match the grammar.
    Syntax(String),
    /// First word does not name a queryable entity.
    UnknownEntity(String),
    /// Field is not a column of the queried entity.
    UnknownField { entity: &'static str, field: String },
    /// Grammatically valid but semantically rejected descriptor.
    Invalid(String),
    Db(DbError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(message) => write!(f, "syntax error: {message}"),
            Self::UnknownEntity(name) => write!(
                f,
                "unknown entity `{name}`; expected departments|employees|projects|roles"
            ),
            Self::UnknownField { entity, field } => {
                write!(f, "unknown field `{field}` for {entity}")
            }
            Self::Invalid(message) => write!(f, "invalid query: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for QueryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
