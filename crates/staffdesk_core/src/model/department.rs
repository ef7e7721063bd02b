//! Department record and create input.

use super::validation::{require_amount, require_text, ValidationError};
use super::{default_location, EntityId};
use serde::{Deserialize, Serialize};

/// Organizational unit owning zero or more employees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: EntityId,
    /// Unique across all departments.
    pub name: String,
    pub location: String,
    /// Non-negative.
    pub budget: f64,
}

/// Input for `DepartmentRepository::create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub budget: f64,
}

impl NewDepartment {
    /// Creates an input with the default location (`HQ`) and a zero budget.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: default_location(),
            budget: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)?;
        require_amount("budget", self.budget)
    }
}
