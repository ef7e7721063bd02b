//! JSON-file store for operator-authored query snippets.
//!
//! # Responsibility
//! - Persist `{id, query}` records in one JSON array document.
//! - Provide add-if-new, edit, delete and full reload.
//!
//! # Invariants
//! - No two records share identical trimmed text on insertion.
//! - New ids are `max(existing id) + 1`, or `1` for an empty document. A
//!   deleted maximal id is therefore issued again by the next insert.
//! - A missing or unparsable document is replaced by an empty array.
//! - Every write replaces the whole document through a temp-file rename.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const EMPTY_DOCUMENT: &str = "[]";

pub type QueryStoreResult<T> = Result<T, QueryStoreError>;

/// One persisted query snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuery {
    pub id: i64,
    pub query: String,
}

#[derive(Debug)]
pub enum QueryStoreError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
}

impl Display for QueryStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "query store I/O failed at `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to serialize stored queries: {err}"),
        }
    }
}

impl Error for QueryStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// File-backed stored-query document.
#[derive(Debug, Clone)]
pub struct QueryStore {
    path: PathBuf,
}

impl QueryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records in document order.
    ///
    /// Missing and corrupt documents are silently reset to an empty array.
    pub fn load(&self) -> QueryStoreResult<Vec<StoredQuery>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.write_document(EMPTY_DOCUMENT)?;
                info!(
                    "event=query_store_load module=query_store status=ok action=created path={}",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        match serde_json::from_str::<Vec<StoredQuery>>(&contents) {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(
                    "event=query_store_load module=query_store status=error action=reset path={} error={}",
                    self.path.display(),
                    err
                );
                self.write_document(EMPTY_DOCUMENT)?;
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole document with `records`.
    pub fn save(&self, records: &[StoredQuery]) -> QueryStoreResult<()> {
        let document = serde_json::to_string_pretty(records).map_err(QueryStoreError::Serialize)?;
        self.write_document(&document)
    }

    /// Appends `text` unless a record with the same trimmed text exists.
    ///
    /// Returns `true` when a record was added.
    pub fn add_if_new(&self, text: &str) -> QueryStoreResult<bool> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut records = self.load()?;
        if records.iter().any(|record| record.query.trim() == trimmed) {
            return Ok(false);
        }

        let id = next_id(&records);
        records.push(StoredQuery {
            id,
            query: trimmed.to_string(),
        });
        self.save(&records)?;
        info!("event=query_store_add module=query_store status=ok id={id}");
        Ok(true)
    }

    /// Rewrites the text of one record in place; no-op when `id` is absent.
    pub fn update(&self, id: i64, text: &str) -> QueryStoreResult<()> {
        self.update_many(&[(id, text.to_string())]).map(|_| ())
    }

    /// Applies several text edits in one load/save cycle.
    ///
    /// Returns the number of records that matched an edit.
    pub fn update_many(&self, edits: &[(i64, String)]) -> QueryStoreResult<usize> {
        let mut records = self.load()?;
        let mut changed = 0;
        for (id, text) in edits {
            if let Some(record) = records.iter_mut().find(|record| record.id == *id) {
                record.query = text.trim().to_string();
                changed += 1;
            }
        }
        if changed > 0 {
            self.save(&records)?;
        }
        Ok(changed)
    }

    /// Removes one record; no-op when `id` is absent.
    pub fn delete(&self, id: i64) -> QueryStoreResult<()> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() != before {
            self.save(&records)?;
            info!("event=query_store_delete module=query_store status=ok id={id}");
        }
        Ok(())
    }

    /// Returns the raw document, creating an empty one when missing.
    pub fn raw_document(&self) -> QueryStoreResult<String> {
        // Runs the repair path so the returned text always parses.
        self.load()?;
        fs::read_to_string(&self.path).map_err(|source| self.io_error(source))
    }

    fn write_document(&self, document: &str) -> QueryStoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, document).map_err(|source| self.io_error(source))?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> QueryStoreError {
        QueryStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn next_id(records: &[StoredQuery]) -> i64 {
    records.iter().map(|record| record.id).max().unwrap_or(0) + 1
}
