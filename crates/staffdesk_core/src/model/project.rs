//! Project record and create input.

use super::validation::{require_amount, require_text, ValidationError};
use super::{default_location, EntityId};
use serde::{Deserialize, Serialize};

/// Project that employees can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub location: String,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub budget: f64,
}

impl NewProject {
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
