//! JSON CRUD handlers for departments, employees, projects and roles.

use crate::error::{ApiError, ApiResult};
use crate::state::{run_blocking, SharedState};
use axum::extract::{Path, State};
use axum::Json;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use staffdesk_core::{
    Department, Employee, EmployeeService, EntityId, EntityService, NewDepartment, NewEmployee,
    NewProject, NewRole, Project, Repository, Role, SqliteDepartmentRepository,
    SqliteEmployeeRepository, SqliteProjectRepository, SqliteRoleRepository,
};

/// `{"detail": ...}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: String,
}

/// Replacement id set for an employee assignment.
#[derive(Debug, Deserialize)]
pub struct AssignmentBody {
    #[serde(default)]
    pub ids: Vec<EntityId>,
}

/// Opens a connection on the blocking pool and hands it to `work`.
async fn with_connection<T, F>(state: &SharedState, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
{
    run_blocking(state, move |state| work(&state.open_connection()?)).await
}

fn list<R: Repository>(repo: R) -> ApiResult<Json<Vec<R::Entity>>> {
    Ok(Json(EntityService::new(repo).get_all()?))
}

fn fetch<R: Repository>(repo: R, label: &str, id: EntityId) -> ApiResult<Json<R::Entity>> {
    EntityService::new(repo)
        .get_by_id(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(label))
}

fn create<R: Repository>(repo: R, input: &R::NewEntity) -> ApiResult<Json<R::Entity>> {
    Ok(Json(EntityService::new(repo).create(input)?))
}

fn remove<R: Repository>(repo: R, label: &str, id: EntityId) -> ApiResult<Json<Detail>> {
    match EntityService::new(repo).delete(id)? {
        Some(_) => Ok(Json(Detail {
            detail: format!("{label} deleted"),
        })),
        None => Err(ApiError::not_found(label)),
    }
}

pub async fn list_departments(State(state): State<SharedState>) -> ApiResult<Json<Vec<Department>>> {
    with_connection(&state, move |conn| list(SqliteDepartmentRepository::new(conn))).await
}

pub async fn get_department(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Department>> {
    with_connection(&state, move |conn| {
        fetch(SqliteDepartmentRepository::new(conn), "Department", id)
    })
    .await
}

pub async fn create_department(
    State(state): State<SharedState>,
    Json(input): Json<NewDepartment>,
) -> ApiResult<Json<Department>> {
    with_connection(&state, move |conn| create(SqliteDepartmentRepository::new(conn), &input)).await
}

pub async fn delete_department(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Detail>> {
    with_connection(&state, move |conn| {
        remove(SqliteDepartmentRepository::new(conn), "Department", id)
    })
    .await
}

pub async fn list_employees(State(state): State<SharedState>) -> ApiResult<Json<Vec<Employee>>> {
    with_connection(&state, move |conn| list(SqliteEmployeeRepository::new(conn))).await
}

pub async fn get_employee(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Employee>> {
    with_connection(&state, move |conn| {
        fetch(SqliteEmployeeRepository::new(conn), "Employee", id)
    })
    .await
}

pub async fn create_employee(
    State(state): State<SharedState>,
    Json(input): Json<NewEmployee>,
) -> ApiResult<Json<Employee>> {
    with_connection(&state, move |conn| create(SqliteEmployeeRepository::new(conn), &input)).await
}

pub async fn delete_employee(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Detail>> {
    with_connection(&state, move |conn| {
        remove(SqliteEmployeeRepository::new(conn), "Employee", id)
    })
    .await
}

pub async fn assign_employee_projects(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
    Json(body): Json<AssignmentBody>,
) -> ApiResult<Json<Employee>> {
    with_connection(&state, move |conn| {
        let service = EmployeeService::new(SqliteEmployeeRepository::new(conn));
        Ok(Json(service.assign_projects(id, &body.ids)?))
    })
    .await
}

pub async fn assign_employee_roles(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
    Json(body): Json<AssignmentBody>,
) -> ApiResult<Json<Employee>> {
    with_connection(&state, move |conn| {
        let service = EmployeeService::new(SqliteEmployeeRepository::new(conn));
        Ok(Json(service.assign_roles(id, &body.ids)?))
    })
    .await
}

pub async fn list_projects(State(state): State<SharedState>) -> ApiResult<Json<Vec<Project>>> {
    with_connection(&state, move |conn| list(SqliteProjectRepository::new(conn))).await
}

pub async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Project>> {
    with_connection(&state, move |conn| {
        fetch(SqliteProjectRepository::new(conn), "Project", id)
    })
    .await
}

pub async fn create_project(
    State(state): State<SharedState>,
    Json(input): Json<NewProject>,
) -> ApiResult<Json<Project>> {
    with_connection(&state, move |conn| create(SqliteProjectRepository::new(conn), &input)).await
}

pub async fn delete_project(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Detail>> {
    with_connection(&state, move |conn| {
        remove(SqliteProjectRepository::new(conn), "Project", id)
    })
    .await
}

pub async fn list_roles(State(state): State<SharedState>) -> ApiResult<Json<Vec<Role>>> {
    with_connection(&state, move |conn| list(SqliteRoleRepository::new(conn))).await
}

pub async fn get_role(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Role>> {
    with_connection(&state, move |conn| fetch(SqliteRoleRepository::new(conn), "Role", id)).await
}

pub async fn create_role(
    State(state): State<SharedState>,
    Json(input): Json<NewRole>,
) -> ApiResult<Json<Role>> {
    with_connection(&state, move |conn| create(SqliteRoleRepository::new(conn), &input)).await
}

pub async fn delete_role(
    State(state): State<SharedState>,
    Path(id): Path<EntityId>,
) -> ApiResult<Json<Detail>> {
    with_connection(&state, move |conn| remove(SqliteRoleRepository::new(conn), "Role", id)).await
}
