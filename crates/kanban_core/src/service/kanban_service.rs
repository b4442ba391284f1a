//! Board/column/card use-case service.
//!
//! # Responsibility
//! - Expose the canonical mutation and query operations.
//! - Map persistence outcomes onto the four caller-facing error kinds.
//! - Apply the configured `AccessPolicy`.
//!
//! # Invariants
//! - Every operation takes an `AuthenticatedUser`; none runs without one.
//! - Under `AccessPolicy::OwnerOnly`, entities that do not trace to a board
//!   owned by the caller are reported as not found.
//! - Atomicity of each write is delegated to one repository call.

use crate::auth::{AuthError, AuthenticatedUser};
use crate::model::board::{Board, BoardId, BoardView};
use crate::model::card::{Card, CardId};
use crate::model::column::{Column, ColumnId};
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::repo::board_repo::BoardRepository;
use crate::repo::card_repo::CardRepository;
use crate::repo::column_repo::ColumnRepository;
use crate::repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    ValidationError,
    OperationFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::NotFound => "NotFound",
            Self::ValidationError => "ValidationError",
            Self::OperationFailed => "OperationFailed",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may mutate what, beyond being authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any authenticated caller may touch any column or card.
    #[default]
    AuthenticatedOnly,
    /// Callers may only touch entities under boards they own.
    OwnerOnly,
}

impl AccessPolicy {
    /// Parses `authenticated` or `owner` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "authenticated" | "authenticated_only" => Some(Self::AuthenticatedOnly),
            "owner" | "owner_only" => Some(Self::OwnerOnly),
            _ => None,
        }
    }
}

/// Errors returned by kanban operations.
#[derive(Debug)]
pub enum KanbanError {
    Unauthenticated(AuthError),
    BoardNotFound(BoardId),
    ColumnNotFound(ColumnId),
    CardNotFound(CardId),
    UserNotFound(UserId),
    Validation(ValidationError),
    /// Owner-only policy needs a board to attach a new column to.
    BoardRequired,
    /// Storage failed after input was accepted.
    OperationFailed(RepoError),
}

impl KanbanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::BoardNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::CardNotFound(_)
            | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) | Self::BoardRequired => ErrorKind::ValidationError,
            Self::OperationFailed(_) => ErrorKind::OperationFailed,
        }
    }

    /// Message safe to hand to callers; storage detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::OperationFailed(_) => "operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for KanbanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated(err) => write!(f, "{err}"),
            Self::BoardNotFound(id) => write!(f, "board with id {id} does not exist"),
            Self::ColumnNotFound(id) => write!(f, "column with id {id} does not exist"),
            Self::CardNotFound(id) => write!(f, "card with id {id} does not exist"),
            Self::UserNotFound(id) => write!(f, "user with id {id} does not exist"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::BoardRequired => write!(f, "a board id is required to create a column"),
            Self::OperationFailed(err) => write!(f, "operation failed: {err}"),
        }
    }
}

impl Error for KanbanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthenticated(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::OperationFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for KanbanError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BoardNotFound(id) => Self::BoardNotFound(id),
            RepoError::ColumnNotFound(id) => Self::ColumnNotFound(id),
            RepoError::CardNotFound(id) => Self::CardNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::OperationFailed(other),
        }
    }
}

impl From<AuthError> for KanbanError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Directory(err) => Self::OperationFailed(err),
            other => Self::Unauthenticated(other),
        }
    }
}

pub type KanbanResult<T> = Result<T, KanbanError>;

/// Kanban operations over a board store.
pub struct KanbanService<R> {
    repo: R,
    policy: AccessPolicy,
}

impl<R> KanbanService<R>
where
    R: BoardRepository + ColumnRepository + CardRepository,
{
    /// Creates a service with the default `AuthenticatedOnly` policy.
    pub fn new(repo: R) -> Self {
        Self::with_policy(repo, AccessPolicy::default())
    }

    pub fn with_policy(repo: R, policy: AccessPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Returns the caller's boards with their columns and cards.
    pub fn list_boards(&self, caller: &AuthenticatedUser) -> KanbanResult<Vec<BoardView>> {
        observe("boards_list", || {
            self.repo
                .list_board_views_for_user(caller.user_id())
                .map_err(Into::into)
        })
    }

    /// Creates a board owned by the caller.
    pub fn create_board(&self, caller: &AuthenticatedUser, title: &str) -> KanbanResult<Board> {
        observe("board_create", || {
            self.repo
                .create_board(caller.user_id(), title)
                .map_err(Into::into)
        })
    }

    /// Deletes one of the caller's boards with everything under it.
    ///
    /// Boards always check ownership, whatever the policy.
    pub fn delete_board(&self, caller: &AuthenticatedUser, board_id: BoardId) -> KanbanResult<()> {
        observe("board_delete", || {
            self.ensure_board_owned(caller, board_id)?;
            self.repo.delete_board(board_id).map_err(Into::into)
        })
    }

    /// Creates an empty column, optionally attached to a board.
    pub fn create_column(
        &self,
        caller: &AuthenticatedUser,
        title: &str,
        board_id: Option<BoardId>,
    ) -> KanbanResult<Column> {
        observe("column_create", || {
            if self.policy == AccessPolicy::OwnerOnly {
                let board_id = board_id.ok_or(KanbanError::BoardRequired)?;
                self.ensure_board_owned(caller, board_id)?;
            }
            self.repo
                .create_column(board_id, title)
                .map_err(Into::into)
        })
    }

    /// Replaces a column title.
    pub fn rename_column(
        &self,
        caller: &AuthenticatedUser,
        column_id: ColumnId,
        title: &str,
    ) -> KanbanResult<Column> {
        observe("column_rename", || {
            self.authorize_column(caller, column_id)?;
            self.repo
                .rename_column(column_id, title)
                .map_err(Into::into)
        })
    }

    /// Deletes a column and every card in it.
    pub fn delete_column(&self, caller: &AuthenticatedUser, column_id: ColumnId) -> KanbanResult<()> {
        observe("column_delete", || {
            self.authorize_column(caller, column_id)?;
            self.repo.delete_column(column_id)?;
            Ok(())
        })
    }

    /// Lists the cards of one column.
    pub fn list_cards(
        &self,
        caller: &AuthenticatedUser,
        column_id: ColumnId,
    ) -> KanbanResult<Vec<Card>> {
        observe("cards_list", || {
            self.authorize_column(caller, column_id)?;
            if self.repo.get_column(column_id)?.is_none() {
                return Err(KanbanError::ColumnNotFound(column_id));
            }
            self.repo
                .list_cards_by_column(column_id)
                .map_err(Into::into)
        })
    }

    /// Creates a card in an existing column.
    pub fn create_card(
        &self,
        caller: &AuthenticatedUser,
        content: &str,
        column_id: ColumnId,
    ) -> KanbanResult<Card> {
        observe("card_create", || {
            self.authorize_column(caller, column_id)?;
            self.repo
                .create_card(column_id, content)
                .map_err(Into::into)
        })
    }

    /// Replaces card content.
    pub fn update_card(
        &self,
        caller: &AuthenticatedUser,
        card_id: CardId,
        content: &str,
    ) -> KanbanResult<Card> {
        observe("card_update", || {
            self.authorize_card(caller, card_id)?;
            self.repo
                .update_card_content(card_id, content)
                .map_err(Into::into)
        })
    }

    /// Moves a card to another column.
    pub fn move_card(
        &self,
        caller: &AuthenticatedUser,
        card_id: CardId,
        destination: ColumnId,
    ) -> KanbanResult<Card> {
        observe("card_move", || {
            self.authorize_card(caller, card_id)?;
            self.authorize_column(caller, destination)?;
            self.repo
                .move_card(card_id, destination)
                .map_err(Into::into)
        })
    }

    /// Deletes one card.
    pub fn delete_card(&self, caller: &AuthenticatedUser, card_id: CardId) -> KanbanResult<()> {
        observe("card_delete", || {
            self.authorize_card(caller, card_id)?;
            self.repo.delete_card(card_id).map_err(Into::into)
        })
    }

    fn ensure_board_owned(&self, caller: &AuthenticatedUser, board_id: BoardId) -> KanbanResult<()> {
        match self.repo.get_board(board_id)? {
            Some(board) if board.user_id == caller.user_id() => Ok(()),
            _ => Err(KanbanError::BoardNotFound(board_id)),
        }
    }

    fn authorize_column(&self, caller: &AuthenticatedUser, column_id: ColumnId) -> KanbanResult<()> {
        if self.policy == AccessPolicy::AuthenticatedOnly {
            return Ok(());
        }
        if self.column_owned_by(caller, column_id)? {
            return Ok(());
        }
        Err(KanbanError::ColumnNotFound(column_id))
    }

    fn authorize_card(&self, caller: &AuthenticatedUser, card_id: CardId) -> KanbanResult<()> {
        if self.policy == AccessPolicy::AuthenticatedOnly {
            return Ok(());
        }
        let card = self
            .repo
            .get_card(card_id)?
            .ok_or(KanbanError::CardNotFound(card_id))?;
        if self.column_owned_by(caller, card.column_id)? {
            return Ok(());
        }
        Err(KanbanError::CardNotFound(card_id))
    }

    fn column_owned_by(&self, caller: &AuthenticatedUser, column_id: ColumnId) -> KanbanResult<bool> {
        let board_id = match self.repo.get_column(column_id)? {
            Some(Column {
                board_id: Some(board_id),
                ..
            }) => board_id,
            _ => return Ok(false),
        };
        Ok(self
            .repo
            .get_board(board_id)?
            .is_some_and(|board| board.user_id == caller.user_id()))
    }
}

fn observe<T>(event: &'static str, op: impl FnOnce() -> KanbanResult<T>) -> KanbanResult<T> {
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) if err.kind() == ErrorKind::OperationFailed => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error_kind={} error={err}",
            err.kind()
        ),
        Err(err) => warn!(
            "event={event} module=service status=rejected duration_ms={duration_ms} error_kind={}",
            err.kind()
        ),
    }
    result
}
