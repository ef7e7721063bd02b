//! HTTP surface for StaffDesk.
//!
//! # Responsibility
//! - Expose entity CRUD as JSON endpoints and the operator console as HTML.
//! - Own process configuration and the shared handler state.
//!
//! # Invariants
//! - Business rules stay in `staffdesk_core`; handlers only translate.

pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::{AppState, SharedState};
