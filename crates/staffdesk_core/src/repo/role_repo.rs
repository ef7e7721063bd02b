//! Role repository backed by the `roles` table.

use super::{RepoError, RepoResult, Repository};
use crate::model::role::{NewRole, Role};
use crate::model::EntityId;
use rusqlite::{Connection, OptionalExtension, Row};

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteRoleRepository<'_> {
    type Entity = Role;
    type NewEntity = NewRole;

    fn get_all(&self) -> RepoResult<Vec<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM roles ORDER BY id ASC;")?;
        let rows = stmt.query_map([], parse_role_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<Role>> {
        let role = self
            .conn
            .query_row(
                "SELECT id, name FROM roles WHERE id = ?1;",
                [id],
                parse_role_row,
            )
            .optional()?;
        Ok(role)
    }

    fn create(&self, input: &NewRole) -> RepoResult<Role> {
        input.validate()?;
        let id = insert_role(self.conn, input)?;
        self.get_by_id(id)?.ok_or(RepoError::InconsistentState(
            "created role not found in read-back",
        ))
    }

    fn delete(&self, id: EntityId) -> RepoResult<Option<Role>> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = SqliteRoleRepository::new(&tx).get_by_id(id)?;
        if existing.is_some() {
            tx.execute("DELETE FROM roles WHERE id = ?1;", [id])?;
        }
        tx.commit()?;
        Ok(existing)
    }
}

pub(crate) fn insert_role(conn: &Connection, input: &NewRole) -> RepoResult<EntityId> {
    conn.execute("INSERT INTO roles (name) VALUES (?1);", [input.name.trim()])?;
    Ok(conn.last_insert_rowid())
}

/// Roles held by one employee, sorted by role id.
pub(crate) fn roles_for_employee(conn: &Connection, employee_id: EntityId) -> RepoResult<Vec<Role>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name
         FROM employee_role er
         INNER JOIN roles r ON r.id = er.role_id
         WHERE er.employee_id = ?1
         ORDER BY r.id ASC;",
    )?;
    let rows = stmt.query_map([employee_id], parse_role_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn parse_role_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
