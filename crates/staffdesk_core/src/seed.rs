//! Demo-data reset and synthesis.
//!
//! # Responsibility
//! - Delete every entity row in dependency order.
//! - Insert randomized departments, projects, roles and employees.
//!
//! # Invariants
//! - Reset and synthesis run in one transaction; a failure leaves the
//!   previous data untouched.
//! - Every seeded employee references a seeded department.
//! - Managers are always chosen among previously inserted employees, so the
//!   seeded manager graph has no cycles.

use crate::model::department::NewDepartment;
use crate::model::employee::{Gender, NewEmployee};
use crate::model::project::NewProject;
use crate::model::role::NewRole;
use crate::model::EntityId;
use crate::repo::department_repo::insert_department;
use crate::repo::employee_repo::insert_employee;
use crate::repo::project_repo::insert_project;
use crate::repo::role_repo::insert_role;
use crate::repo::RepoError;
use chrono::{Duration, Local, NaiveDate};
use log::{error, info};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const DEPARTMENT_NAMES: &[&str] = &[
    "HR",
    "Finance",
    "IT",
    "Sales",
    "Marketing",
    "Support",
    "Operations",
];
const LOCATIONS: &[&str] = &["HQ", "Berlin", "Austin", "Singapore", "Remote"];
const PROJECT_NAMES: &[&str] = &["Apollo", "Borealis", "Cobalt", "Delta", "Ember"];
const ROLE_NAMES: &[&str] = &["Engineer", "Manager", "Analyst", "Designer", "Intern"];
const FIRST_NAMES: &[(&str, Gender)] = &[
    ("Alice", Gender::Female),
    ("Bruno", Gender::Male),
    ("Chiara", Gender::Female),
    ("Dmitri", Gender::Male),
    ("Elena", Gender::Female),
    ("Farid", Gender::Male),
    ("Grace", Gender::Female),
    ("Hiro", Gender::Male),
    ("Ines", Gender::Female),
    ("Jonas", Gender::Male),
    ("Kai", Gender::Other),
    ("Lena", Gender::Female),
    ("Mateo", Gender::Male),
    ("Nadia", Gender::Female),
    ("Omar", Gender::Male),
    ("Priya", Gender::Female),
    ("Quinn", Gender::Other),
    ("Rafael", Gender::Male),
    ("Sofia", Gender::Female),
    ("Tomas", Gender::Male),
];
const HIRE_WINDOW_DAYS: i64 = 3650;

/// Requested demo-data volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRequest {
    pub n_departments: u32,
    pub n_employees: u32,
}

impl Default for SeedRequest {
    fn default() -> Self {
        Self {
            n_departments: 5,
            n_employees: 50,
        }
    }
}

/// Row counts inserted by one seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub departments: usize,
    pub employees: usize,
    pub projects: usize,
    pub roles: usize,
}

#[derive(Debug)]
pub enum SeedError {
    /// Employees were requested without any department to place them in.
    NoDepartments { n_employees: u32 },
    Repo(RepoError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDepartments { n_employees } => write!(
                f,
                "cannot seed {n_employees} employees without at least one department"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NoDepartments { .. } => None,
        }
    }
}

impl From<RepoError> for SeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SeedError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Replaces all entity rows with freshly generated demo data.
pub fn seed_demo_data<R: Rng + ?Sized>(
    conn: &mut Connection,
    request: &SeedRequest,
    rng: &mut R,
) -> Result<SeedSummary, SeedError> {
    if request.n_departments == 0 && request.n_employees > 0 {
        return Err(SeedError::NoDepartments {
            n_employees: request.n_employees,
        });
    }

    let started_at = Instant::now();
    let result = seed_in_transaction(conn, request, rng, Local::now().date_naive());
    match &result {
        Ok(summary) => info!(
            "event=seed module=seed status=ok departments={} employees={} projects={} roles={} duration_ms={}",
            summary.departments,
            summary.employees,
            summary.projects,
            summary.roles,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=seed module=seed status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn seed_in_transaction<R: Rng + ?Sized>(
    conn: &mut Connection,
    request: &SeedRequest,
    rng: &mut R,
    today: NaiveDate,
) -> Result<SeedSummary, SeedError> {
    let tx = conn.transaction()?;
    clear_all(&tx)?;

    let mut department_ids = Vec::new();
    for index in 0..request.n_departments as usize {
        let name = DEPARTMENT_NAMES
            .get(index)
            .map(|name| (*name).to_string())
            .unwrap_or_else(|| format!("Department {}", index + 1));
        let department = NewDepartment {
            name,
            location: pick(rng, LOCATIONS).to_string(),
            budget: f64::from(rng.gen_range(50..=500u32)) * 1_000.0,
        };
        department_ids.push(insert_department(&tx, &department)?);
    }

    let mut project_ids = Vec::new();
    for name in PROJECT_NAMES {
        let project = NewProject {
            name: (*name).to_string(),
            location: pick(rng, LOCATIONS).to_string(),
            budget: f64::from(rng.gen_range(20..=300u32)) * 1_000.0,
        };
        project_ids.push(insert_project(&tx, &project)?);
    }

    let mut role_ids = Vec::new();
    for name in ROLE_NAMES {
        role_ids.push(insert_role(&tx, &NewRole::new(*name))?);
    }

    let mut employee_ids: Vec<EntityId> = Vec::new();
    for index in 0..request.n_employees as usize {
        let (first_name, gender) = *pick(rng, FIRST_NAMES);
        let Some(dep_id) = department_ids.choose(rng).copied() else {
            break;
        };
        let manager_id = if rng.gen_bool(0.7) {
            employee_ids.choose(rng).copied()
        } else {
            None
        };

        let employee = NewEmployee {
            name: first_name.to_string(),
            age: Some(rng.gen_range(22..=55)),
            email: Some(format!(
                "{}.{}@example.com",
                first_name.to_lowercase(),
                index + 1
            )),
            salary: f64::from(rng.gen_range(30..=150u32)) * 1_000.0,
            bonus: f64::from(rng.gen_range(0..=20u32)) * 500.0,
            hire_date: Some(today - Duration::days(rng.gen_range(0..HIRE_WINDOW_DAYS))),
            active: rng.gen_bool(0.9),
            gender,
            dep_id,
            manager_id,
            project_ids: sample(rng, &project_ids, 2),
            role_ids: sample(rng, &role_ids, 1),
        };
        employee_ids.push(insert_employee(&tx, &employee)?);
    }

    tx.commit()?;

    Ok(SeedSummary {
        departments: department_ids.len(),
        employees: employee_ids.len(),
        projects: project_ids.len(),
        roles: role_ids.len(),
    })
}

/// Deletes every entity row; association tables first, then employees,
/// then the tables employees reference.
fn clear_all(conn: &Connection) -> Result<(), SeedError> {
    conn.execute_batch(
        "DELETE FROM employee_project;
         DELETE FROM employee_role;
         DELETE FROM employees;
         DELETE FROM departments;
         DELETE FROM projects;
         DELETE FROM roles;",
    )?;
    Ok(())
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn sample<R: Rng + ?Sized>(rng: &mut R, ids: &[EntityId], max: usize) -> Vec<EntityId> {
    let count = rng.gen_range(0..=max.min(ids.len()));
    ids.choose_multiple(rng, count).copied().collect()
}
