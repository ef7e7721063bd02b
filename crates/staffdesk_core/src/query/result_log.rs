//! Process-lifetime log of evaluated queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One output row: column label to JSON value.
pub type QueryRow = Map<String, JsonValue>;

/// Outcome of one evaluated query line.
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub result: Option<Vec<QueryRow>>,
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn success(query: impl Into<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            query: query.into(),
            result: Some(rows),
            error: None,
        }
    }

    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Append-only, unbounded list of outcomes in submission order.
///
/// Not persisted; cleared only through `clear`.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: Vec<QueryOutcome>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, outcomes: impl IntoIterator<Item = QueryOutcome>) {
        self.entries.extend(outcomes);
    }

    pub fn entries(&self) -> &[QueryOutcome] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
