//! Connection factory.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Returned connections have every schema step applied.
//! - File databases use WAL so per-request connections do not block readers.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{debug, error};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Display for Target<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "mode=file path={}", path.display()),
            Self::Memory => write!(f, "mode=memory"),
        }
    }
}

/// Opens (creating if needed) a database file with the schema up to date.
///
/// The HTTP layer calls this once per request; the connection is released
/// when the returned value is dropped.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target(Target::File(path.as_ref()))
}

/// Opens a private in-memory database with the schema up to date.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(Target::Memory)
}

fn open_target(target: Target<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect(&target);
    match &result {
        Ok(_) => debug!(
            "event=db_open module=db status=ok {} duration_ms={}",
            target,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error {} duration_ms={} error={}",
            target,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn connect(target: &Target<'_>) -> DbResult<Connection> {
    let mut conn = match target {
        Target::File(path) => {
            let conn = Connection::open(path)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn
        }
        Target::Memory => Connection::open_in_memory()?,
    };
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}
