//! Entity use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for HTTP handlers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - The service adds no business rule of its own; it is the seam where one
//!   would be inserted.

use crate::model::employee::Employee;
use crate::model::EntityId;
use crate::repo::department_repo::SqliteDepartmentRepository;
use crate::repo::employee_repo::{EmployeeAssignments, SqliteEmployeeRepository};
use crate::repo::project_repo::SqliteProjectRepository;
use crate::repo::role_repo::SqliteRoleRepository;
use crate::repo::{RepoError, RepoResult, Repository};

pub type DepartmentService<'conn> = EntityService<SqliteDepartmentRepository<'conn>>;
pub type EmployeeService<'conn> = EntityService<SqliteEmployeeRepository<'conn>>;
pub type ProjectService<'conn> = EntityService<SqliteProjectRepository<'conn>>;
pub type RoleService<'conn> = EntityService<SqliteRoleRepository<'conn>>;

/// Use-case service wrapper over any entity repository.
pub struct EntityService<R: Repository> {
    repo: R,
}

impl<R: Repository> EntityService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_all(&self) -> RepoResult<Vec<R::Entity>> {
        self.repo.get_all()
    }

    pub fn get_by_id(&self, id: EntityId) -> RepoResult<Option<R::Entity>> {
        self.repo.get_by_id(id)
    }

    pub fn create(&self, input: &R::NewEntity) -> RepoResult<R::Entity> {
        self.repo.create(input)
    }

    pub fn delete(&self, id: EntityId) -> RepoResult<Option<R::Entity>> {
        self.repo.delete(id)
    }
}

impl<R> EntityService<R>
where
    R: Repository<Entity = Employee> + EmployeeAssignments,
{
    /// Replaces project assignments and returns the refreshed employee.
    pub fn assign_projects(
        &self,
        employee_id: EntityId,
        project_ids: &[EntityId],
    ) -> RepoResult<Employee> {
        self.repo.set_projects(employee_id, project_ids)?;
        self.read_back(employee_id)
    }

    /// Replaces role assignments and returns the refreshed employee.
    pub fn assign_roles(&self, employee_id: EntityId, role_ids: &[EntityId]) -> RepoResult<Employee> {
        self.repo.set_roles(employee_id, role_ids)?;
        self.read_back(employee_id)
    }

    fn read_back(&self, employee_id: EntityId) -> RepoResult<Employee> {
        self.repo
            .get_by_id(employee_id)?
            .ok_or(RepoError::InconsistentState(
                "employee missing after assignment replacement",
            ))
    }
}
