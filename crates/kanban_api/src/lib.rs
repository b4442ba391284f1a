//! Request facade over `kanban_core`.
//!
//! Callers hand in headers plus a named operation and get back a
//! `{ok, data | error}` envelope.

pub mod api;
pub mod config;

pub use api::{to_json, ApiError, ApiResponse, KanbanApi, Operation, Payload};
pub use config::{ApiConfig, ConfigError};
