//! Domain records for the organizational data set.
//!
//! # Responsibility
//! - Define the entities persisted by the repositories.
//! - Define create inputs and their validation rules.
//!
//! # Invariants
//! - Every persisted entity is identified by a store-generated `EntityId`.
//! - Create inputs are validated before any SQL mutation.

pub mod department;
pub mod employee;
pub mod project;
pub mod role;
pub mod validation;

/// Store-generated primary key shared by all entity tables.
pub type EntityId = i64;

pub(crate) fn default_location() -> String {
    "HQ".to_string()
}
