//! Employee repository and assignment operations.
//!
//! # Responsibility
//! - Provide CRUD over the `employees` table.
//! - Own project/role assignment replacement with atomic semantics.
//!
//! # Invariants
//! - Reads resolve the owning department and the project/role lists.
//! - `set_projects`/`set_roles` replace the whole association set in a single
//!   transaction; duplicate ids are collapsed.
//! - Manager cycles are not checked here.

use super::department_repo::fetch_department;
use super::project_repo::projects_for_employee;
use super::role_repo::roles_for_employee;
use super::{bool_to_int, int_to_bool, RepoError, RepoResult, Repository};
use crate::model::employee::{Employee, Gender, NewEmployee};
use crate::model::EntityId;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    name,
    age,
    email,
    salary,
    bonus,
    hire_date,
    active,
    gender,
    dep_id,
    manager_id
FROM employees";

/// Assignment operations layered on top of the employee CRUD contract.
pub trait EmployeeAssignments {
    /// Replaces all project assignments of one employee.
    fn set_projects(&self, employee_id: EntityId, project_ids: &[EntityId]) -> RepoResult<()>;
    /// Replaces all role assignments of one employee.
    fn set_roles(&self, employee_id: EntityId, role_ids: &[EntityId]) -> RepoResult<()>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteEmployeeRepository<'_> {
    type Entity = Employee;
    type NewEntity = NewEmployee;

    fn get_all(&self) -> RepoResult<Vec<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(self.conn, row)?);
        }
        Ok(employees)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<Employee>> {
        fetch_employee(self.conn, id)
    }

    fn create(&self, input: &NewEmployee) -> RepoResult<Employee> {
        input.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_employee(&tx, input)?;
        tx.commit()?;

        fetch_employee(self.conn, id)?.ok_or(RepoError::InconsistentState(
            "created employee not found in read-back",
        ))
    }

    fn delete(&self, id: EntityId) -> RepoResult<Option<Employee>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = fetch_employee(&tx, id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM employees WHERE id = ?1;", [id])?;
        }
        tx.commit()?;
        Ok(existing)
    }
}

impl EmployeeAssignments for SqliteEmployeeRepository<'_> {
    fn set_projects(&self, employee_id: EntityId, project_ids: &[EntityId]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_employee_exists(&tx, employee_id)?;
        tx.execute(
            "DELETE FROM employee_project WHERE employee_id = ?1;",
            [employee_id],
        )?;
        link_projects(&tx, employee_id, project_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn set_roles(&self, employee_id: EntityId, role_ids: &[EntityId]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_employee_exists(&tx, employee_id)?;
        tx.execute(
            "DELETE FROM employee_role WHERE employee_id = ?1;",
            [employee_id],
        )?;
        link_roles(&tx, employee_id, role_ids)?;
        tx.commit()?;
        Ok(())
    }
}

/// Inserts the employee row plus its initial assignments.
///
/// Callers own the surrounding transaction.
pub(crate) fn insert_employee(conn: &Connection, input: &NewEmployee) -> RepoResult<EntityId> {
    conn.execute(
        "INSERT INTO employees (
            name,
            age,
            email,
            salary,
            bonus,
            hire_date,
            active,
            gender,
            dep_id,
            manager_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            input.name.trim(),
            input.age,
            input.email.as_deref().map(str::trim),
            input.salary,
            input.bonus,
            input.effective_hire_date(),
            bool_to_int(input.active),
            input.gender.as_str(),
            input.dep_id,
            input.manager_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    link_projects(conn, id, &input.project_ids)?;
    link_roles(conn, id, &input.role_ids)?;
    Ok(id)
}

fn link_projects(conn: &Connection, employee_id: EntityId, project_ids: &[EntityId]) -> RepoResult<()> {
    let unique: BTreeSet<EntityId> = project_ids.iter().copied().collect();
    for project_id in unique {
        conn.execute(
            "INSERT INTO employee_project (employee_id, project_id) VALUES (?1, ?2);",
            params![employee_id, project_id],
        )?;
    }
    Ok(())
}

fn link_roles(conn: &Connection, employee_id: EntityId, role_ids: &[EntityId]) -> RepoResult<()> {
    let unique: BTreeSet<EntityId> = role_ids.iter().copied().collect();
    for role_id in unique {
        conn.execute(
            "INSERT INTO employee_role (employee_id, role_id) VALUES (?1, ?2);",
            params![employee_id, role_id],
        )?;
    }
    Ok(())
}

fn ensure_employee_exists(conn: &Connection, employee_id: EntityId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?1);",
        [employee_id],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::NotFound {
            entity: "employee",
            id: employee_id,
        });
    }
    Ok(())
}

fn fetch_employee(conn: &Connection, id: EntityId) -> RepoResult<Option<Employee>> {
    let mut stmt = conn.prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_employee_row(conn, row)?));
    }
    Ok(None)
}

fn parse_employee_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Employee> {
    let id: EntityId = row.get("id")?;
    let dep_id: EntityId = row.get("dep_id")?;

    let gender_text: String = row.get("gender")?;
    let gender = Gender::parse(&gender_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid gender `{gender_text}` in employees.gender"))
    })?;

    Ok(Employee {
        id,
        name: row.get("name")?,
        age: row.get("age")?,
        email: row.get("email")?,
        salary: row.get("salary")?,
        bonus: row.get("bonus")?,
        hire_date: row.get("hire_date")?,
        active: int_to_bool("employees.active", row.get("active")?)?,
        gender,
        dep_id,
        manager_id: row.get("manager_id")?,
        department: fetch_department(conn, dep_id)?,
        projects: projects_for_employee(conn, id)?,
        roles: roles_for_employee(conn, id)?,
    })
}
