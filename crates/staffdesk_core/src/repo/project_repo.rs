//! Project repository backed by the `projects` table.

use super::{RepoError, RepoResult, Repository};
use crate::model::project::{NewProject, Project};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT id, name, location, budget FROM projects";

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteProjectRepository<'_> {
    type Entity = Project;
    type NewEntity = NewProject;

    fn get_all(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_project_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_project_row,
            )
            .optional()?;
        Ok(project)
    }

    fn create(&self, input: &NewProject) -> RepoResult<Project> {
        input.validate()?;
        let id = insert_project(self.conn, input)?;
        self.get_by_id(id)?.ok_or(RepoError::InconsistentState(
            "created project not found in read-back",
        ))
    }

    fn delete(&self, id: EntityId) -> RepoResult<Option<Project>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = SqliteProjectRepository::new(&tx).get_by_id(id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        }
        tx.commit()?;
        Ok(existing)
    }
}

pub(crate) fn insert_project(conn: &Connection, input: &NewProject) -> RepoResult<EntityId> {
    conn.execute(
        "INSERT INTO projects (name, location, budget) VALUES (?1, ?2, ?3);",
        params![input.name.trim(), input.location.trim(), input.budget],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Projects assigned to one employee, sorted by project id.
pub(crate) fn projects_for_employee(
    conn: &Connection,
    employee_id: EntityId,
) -> RepoResult<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.location, p.budget
         FROM employee_project ep
         INNER JOIN projects p ON p.id = ep.project_id
         WHERE ep.employee_id = ?1
         ORDER BY p.id ASC;",
    )?;
    let rows = stmt.query_map([employee_id], parse_project_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        location: row.get("location")?,
        budget: row.get("budget")?,
    })
}
