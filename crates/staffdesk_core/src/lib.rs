//! Core domain logic for StaffDesk.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod query_store;
pub mod repo;
pub mod seed;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::department::{Department, NewDepartment};
pub use model::employee::{Employee, Gender, NewEmployee};
pub use model::project::{NewProject, Project};
pub use model::role::{NewRole, Role};
pub use model::validation::ValidationError;
pub use model::EntityId;
pub use query::eval::QueryEvaluator;
pub use query::result_log::{QueryOutcome, QueryRow, ResultLog};
pub use query::QueryError;
pub use query_store::{QueryStore, QueryStoreError, StoredQuery};
pub use repo::department_repo::SqliteDepartmentRepository;
pub use repo::employee_repo::{EmployeeAssignments, SqliteEmployeeRepository};
pub use repo::project_repo::SqliteProjectRepository;
pub use repo::role_repo::SqliteRoleRepository;
pub use repo::{RepoError, RepoResult, Repository};
pub use seed::{seed_demo_data, SeedError, SeedRequest, SeedSummary};
pub use service::entity_service::{
    DepartmentService, EmployeeService, EntityService, ProjectService, RoleService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
