//! Department repository backed by the `departments` table.

use super::{RepoError, RepoResult, Repository};
use crate::model::department::{Department, NewDepartment};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const DEPARTMENT_SELECT_SQL: &str = "SELECT id, name, location, budget FROM departments";

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteDepartmentRepository<'_> {
    type Entity = Department;
    type NewEntity = NewDepartment;

    fn get_all(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DEPARTMENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_department_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<Department>> {
        fetch_department(self.conn, id)
    }

    fn create(&self, input: &NewDepartment) -> RepoResult<Department> {
        input.validate()?;
        let id = insert_department(self.conn, input)?;
        fetch_department(self.conn, id)?.ok_or(RepoError::InconsistentState(
            "created department not found in read-back",
        ))
    }

    fn delete(&self, id: EntityId) -> RepoResult<Option<Department>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = fetch_department(&tx, id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM departments WHERE id = ?1;", [id])?;
        }
        tx.commit()?;
        Ok(existing)
    }
}

pub(crate) fn insert_department(conn: &Connection, input: &NewDepartment) -> RepoResult<EntityId> {
    conn.execute(
        "INSERT INTO departments (name, location, budget) VALUES (?1, ?2, ?3);",
        params![input.name.trim(), input.location.trim(), input.budget],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn fetch_department(conn: &Connection, id: EntityId) -> RepoResult<Option<Department>> {
    let department = conn
        .query_row(
            &format!("{DEPARTMENT_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_department_row,
        )
        .optional()?;
    Ok(department)
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        location: row.get("location")?,
        budget: row.get("budget")?,
    })
}
