//! Core domain logic for the kanban board backend.
//!
//! Boards belong to users, columns belong to boards, cards belong to columns.
//! This crate owns the persistence model, the bearer-token gate and the
//! operations that mutate the board structure.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{
    AuthError, AuthGate, AuthenticatedUser, Headers, StaticTokenVerifier, TokenIdentity,
    TokenRejection, TokenVerifier, VerifiedCredential,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardId, BoardView, ColumnView};
pub use model::card::{Card, CardId};
pub use model::column::{Column, ColumnId};
pub use model::user::{User, UserId};
pub use model::ValidationError;
pub use repo::board_repo::BoardRepository;
pub use repo::card_repo::CardRepository;
pub use repo::column_repo::ColumnRepository;
pub use repo::user_repo::UserRepository;
pub use repo::{RepoError, RepoResult, SqliteKanbanRepository};
pub use service::kanban_service::{
    AccessPolicy, ErrorKind, KanbanError, KanbanResult, KanbanService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
