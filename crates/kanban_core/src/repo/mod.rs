//! Repository contracts and the SQLite board store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Multi-statement writes run in one `IMMEDIATE` transaction; a failure
//!   rolls back every statement of that write.
//! - Missing rows surface as entity-specific `NotFound` variants, never as
//!   raw SQLite errors.

pub mod board_repo;
pub mod card_repo;
pub mod column_repo;
pub mod user_repo;

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::board::BoardId;
use crate::model::card::CardId;
use crate::model::column::ColumnId;
use crate::model::user::UserId;
use crate::model::ValidationError;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for board store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    UserNotFound(UserId),
    BoardNotFound(BoardId),
    ColumnNotFound(ColumnId),
    CardNotFound(CardId),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing from a migrated connection.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid model.
    InvalidData(String),
}

impl RepoError {
    /// Whether this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::BoardNotFound(_)
                | Self::ColumnNotFound(_)
                | Self::CardNotFound(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const REQUIRED_TABLES: &[&str] = &["users", "boards", "columns", "cards"];

/// SQLite-backed store implementing every repository contract.
///
/// Holds a borrowed connection; one store lives for one request.
pub struct SqliteKanbanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKanbanRepository<'conn> {
    /// Creates the store from a connection returned by `open_db*`.
    ///
    /// Rejects connections that were not migrated to the latest schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn row_exists(conn: &Connection, sql: &str, id: Uuid) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(sql, [id.to_string()], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn ensure_board_exists(conn: &Connection, board_id: BoardId) -> RepoResult<()> {
    if row_exists(conn, "SELECT 1 FROM boards WHERE id = ?1;", board_id)? {
        return Ok(());
    }
    Err(RepoError::BoardNotFound(board_id))
}

pub(crate) fn ensure_column_exists(conn: &Connection, column_id: ColumnId) -> RepoResult<()> {
    if row_exists(conn, "SELECT 1 FROM columns WHERE id = ?1;", column_id)? {
        return Ok(());
    }
    Err(RepoError::ColumnNotFound(column_id))
}

pub(crate) fn ensure_card_exists(conn: &Connection, card_id: CardId) -> RepoResult<()> {
    if row_exists(conn, "SELECT 1 FROM cards WHERE id = ?1;", card_id)? {
        return Ok(());
    }
    Err(RepoError::CardNotFound(card_id))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
