//! Shared handler state.
//!
//! # Invariants
//! - Handlers open one connection per request; it closes when dropped.
//! - Store and file work runs on the blocking pool via `run_blocking`.
//! - The query store and result log are each guarded by their own mutex.
//! - A poisoned mutex surfaces as an internal error, never a panic.

use crate::error::{ApiError, ApiResult};
use rusqlite::Connection;
use staffdesk_core::db::open_db;
use staffdesk_core::{QueryEvaluator, QueryStore, ResultLog};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    db_path: PathBuf,
    query_store: Mutex<QueryStore>,
    results: Mutex<ResultLog>,
    evaluator: QueryEvaluator,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, query_store: QueryStore) -> Self {
        Self {
            db_path: db_path.into(),
            query_store: Mutex::new(query_store),
            results: Mutex::new(ResultLog::new()),
            evaluator: QueryEvaluator::new(),
        }
    }

    /// Replaces the evaluator, e.g. to pin date helpers in tests.
    pub fn with_evaluator(mut self, evaluator: QueryEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn open_connection(&self) -> ApiResult<Connection> {
        Ok(open_db(&self.db_path)?)
    }

    pub fn query_store(&self) -> ApiResult<MutexGuard<'_, QueryStore>> {
        self.query_store
            .lock()
            .map_err(|_| ApiError::lock_poisoned("query store"))
    }

    pub fn results(&self) -> ApiResult<MutexGuard<'_, ResultLog>> {
        self.results
            .lock()
            .map_err(|_| ApiError::lock_poisoned("result log"))
    }

    pub fn evaluator(&self) -> QueryEvaluator {
        self.evaluator
    }
}

/// Runs `work` against the shared state on the blocking thread pool.
pub async fn run_blocking<T, F>(state: &SharedState, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> ApiResult<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(state.as_ref())).await?
}

#[cfg(test)]
mod tests {
    use super::{run_blocking, AppState, SharedState};
    use crate::error::ApiError;
    use staffdesk_core::QueryStore;
    use std::sync::Arc;

    fn state(dir: &tempfile::TempDir) -> SharedState {
        Arc::new(AppState::new(
            dir.path().join("staffdesk.db"),
            QueryStore::new(dir.path().join("saved_queries.json")),
        ))
    }

    #[tokio::test]
    async fn blocking_work_runs_on_another_thread() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);
        let caller = std::thread::current().id();

        let (worker, autocommit) = run_blocking(&state, |state| {
            let conn = state.open_connection()?;
            state.results()?.clear();
            Ok((std::thread::current().id(), conn.is_autocommit()))
        })
        .await
        .expect("blocking work succeeds");
        assert_ne!(worker, caller);
        assert!(autocommit);
        assert!(dir.path().join("staffdesk.db").exists());
    }

    #[tokio::test]
    async fn panicking_work_becomes_internal_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = state(&dir);

        let err = run_blocking(&state, |_| -> Result<(), ApiError> {
            panic!("worker gave up")
        })
        .await
        .expect_err("panic is reported");
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
