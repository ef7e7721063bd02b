//! HTTP error mapping.
//!
//! # Invariants
//! - Every error body is `{"detail": "<message>"}`.
//! - Store constraint violations map to 409, validation faults to 422.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use staffdesk_core::db::DbError;
use staffdesk_core::{QueryStoreError, RepoError, SeedError};
use tokio::task::JoinError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(detail)
            | Self::Validation(detail)
            | Self::Conflict(detail)
            | Self::Internal(detail) => detail,
        }
    }

    /// `404` with the `<Entity> not found` detail.
    pub fn not_found(label: &str) -> Self {
        Self::NotFound(format!("{label} not found"))
    }

    pub fn lock_poisoned(name: &str) -> Self {
        Self::Internal(format!("{name} lock poisoned"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(
                "event=http_error module=server status=error code={} error={}",
                status.as_u16(),
                self.detail()
            );
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        if value.is_constraint_violation() {
            return Self::Conflict(value.to_string());
        }
        match value {
            RepoError::NotFound { entity, .. } => Self::not_found(&capitalize(entity)),
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<QueryStoreError> for ApiError {
    fn from(value: QueryStoreError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<SeedError> for ApiError {
    fn from(value: SeedError) -> Self {
        match value {
            SeedError::Repo(err) => err.into(),
            no_departments @ SeedError::NoDepartments { .. } => {
                Self::Validation(no_departments.to_string())
            }
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(value: JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {value}"))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use staffdesk_core::{RepoError, SeedError, ValidationError};

    #[test]
    fn repo_errors_map_to_http_statuses() {
        let missing: ApiError = RepoError::NotFound {
            entity: "employee",
            id: 3,
        }
        .into();
        assert_eq!(missing, ApiError::NotFound("Employee not found".to_string()));

        let invalid: ApiError = RepoError::Validation(ValidationError::EmptyField("name")).into();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let broken: ApiError = RepoError::InconsistentState("gone").into();
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn seed_without_departments_is_a_validation_error() {
        let err: ApiError = SeedError::NoDepartments { n_employees: 4 }.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.detail().contains("4 employees"));
    }
}
