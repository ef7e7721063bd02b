//! Employee record and create input.
//!
//! # Invariants
//! - `dep_id` always references an existing department.
//! - `manager_id`, when set, references an existing employee. Cycles in the
//!   manager chain are not rejected.
//! - `email`, when set, is unique across employees.

use super::department::Department;
use super::project::Project;
use super::role::Role;
use super::validation::{require_amount, require_email, require_text, ValidationError, MAX_AGE};
use super::EntityId;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Gender tag stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Staff member with first-level relations resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub salary: f64,
    pub bonus: f64,
    pub hire_date: NaiveDate,
    pub active: bool,
    pub gender: Gender,
    pub dep_id: EntityId,
    pub manager_id: Option<EntityId>,
    /// Owning department, resolved from `dep_id`.
    pub department: Option<Department>,
    /// Sorted by project id.
    pub projects: Vec<Project>,
    /// Sorted by role id.
    pub roles: Vec<Role>,
}

/// Input for `EmployeeRepository::create`.
///
/// Omitted optional fields fall back to: zero salary/bonus, hire date today,
/// active, gender `other`, no manager, no assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub gender: Gender,
    pub dep_id: EntityId,
    #[serde(default)]
    pub manager_id: Option<EntityId>,
    #[serde(default)]
    pub project_ids: Vec<EntityId>,
    #[serde(default)]
    pub role_ids: Vec<EntityId>,
}

fn default_active() -> bool {
    true
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, dep_id: EntityId) -> Self {
        Self {
            name: name.into(),
            age: None,
            email: None,
            salary: 0.0,
            bonus: 0.0,
            hire_date: None,
            active: true,
            gender: Gender::Other,
            dep_id,
            manager_id: None,
            project_ids: Vec::new(),
            role_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if let Some(age) = self.age {
            if age > MAX_AGE {
                return Err(ValidationError::AgeOutOfRange(age));
            }
        }
        if let Some(email) = self.email.as_deref() {
            require_email(email)?;
        }
        require_amount("salary", self.salary)?;
        require_amount("bonus", self.bonus)
    }

    /// Hire date to persist: the explicit value or the current local date.
    pub fn effective_hire_date(&self) -> NaiveDate {
        self.hire_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}
