//! Query/mutation facade.
//!
//! # Responsibility
//! - Name the operation set and its argument shapes.
//! - Run the gate, dispatch to `KanbanService`, and wrap the outcome in a
//!   response envelope.
//!
//! # Invariants
//! - No business rule lives here.
//! - Every request opens its own connection; nothing is cached between calls.
//! - The credential is verified before the store is opened, so a rejected
//!   request never creates or migrates a database.
//! - Never panics; every failure becomes an error envelope.
//! - Storage error detail is logged, never returned.

use crate::config::ApiConfig;
use kanban_core::db::open_db;
use kanban_core::{
    AccessPolicy, AuthGate, Board, BoardId, BoardView, Card, CardId, Column, ColumnId, ErrorKind,
    Headers, KanbanError, KanbanService, SqliteKanbanRepository, TokenVerifier,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One named operation with typed arguments.
///
/// Wire shape: `{"operation": "moveCard", "arguments": {"cardId": ..., "newColumnId": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "operation", content = "arguments", rename_all = "camelCase")]
pub enum Operation {
    /// Lists the caller's boards with columns and cards.
    Boards,
    #[serde(rename_all = "camelCase")]
    Cards {
        column_id: ColumnId,
    },
    CreateBoard {
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteBoard {
        board_id: BoardId,
    },
    #[serde(rename_all = "camelCase")]
    CreateColumn {
        title: String,
        #[serde(default)]
        board_id: Option<BoardId>,
    },
    #[serde(rename_all = "camelCase")]
    RenameColumn {
        column_id: ColumnId,
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteColumn {
        column_id: ColumnId,
    },
    #[serde(rename_all = "camelCase")]
    CreateCard {
        content: String,
        column_id: ColumnId,
    },
    #[serde(rename_all = "camelCase")]
    UpdateCard {
        card_id: CardId,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    MoveCard {
        card_id: CardId,
        new_column_id: ColumnId,
    },
    #[serde(rename_all = "camelCase")]
    DeleteCard {
        card_id: CardId,
    },
}

impl Operation {
    /// Wire name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boards => "boards",
            Self::Cards { .. } => "cards",
            Self::CreateBoard { .. } => "createBoard",
            Self::DeleteBoard { .. } => "deleteBoard",
            Self::CreateColumn { .. } => "createColumn",
            Self::RenameColumn { .. } => "renameColumn",
            Self::DeleteColumn { .. } => "deleteColumn",
            Self::CreateCard { .. } => "createCard",
            Self::UpdateCard { .. } => "updateCard",
            Self::MoveCard { .. } => "moveCard",
            Self::DeleteCard { .. } => "deleteCard",
        }
    }
}

/// Success payload: the affected entity, a listing, or a success flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Payload {
    Board(Board),
    Boards(Vec<BoardView>),
    Column(Column),
    Card(Card),
    Cards(Vec<Card>),
    Success(bool),
}

/// Error body: kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
}

/// Response envelope returned for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiResponse {
    fn success(data: Payload) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ApiError {
                kind: kind.as_str().to_string(),
                message: message.into(),
            }),
        }
    }

    /// Error kind of a failed response.
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.kind.as_str())
    }
}

impl From<KanbanError> for ApiResponse {
    fn from(value: KanbanError) -> Self {
        Self::failure(value.kind(), value.public_message())
    }
}

type SharedVerifier = Box<dyn TokenVerifier + Send + Sync>;

/// Entry surface for all kanban operations.
///
/// Safe to share across threads; each call is independent.
pub struct KanbanApi {
    db_path: PathBuf,
    gate: AuthGate<SharedVerifier>,
    policy: AccessPolicy,
}

impl KanbanApi {
    pub fn new(
        db_path: impl Into<PathBuf>,
        verifier: impl TokenVerifier + Send + Sync + 'static,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            gate: AuthGate::new(Box::new(verifier)),
            policy,
        }
    }

    pub fn from_config(config: ApiConfig) -> Self {
        Self::new(config.db_path, config.tokens, config.access_policy)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Executes one operation for the caller identified by `headers`.
    pub fn execute(&self, headers: &Headers, operation: Operation) -> ApiResponse {
        let op_name = operation.name();
        let credential = match self.gate.verify_credential(headers) {
            Ok(credential) => credential,
            Err(err) => return KanbanError::from(err).into(),
        };

        let conn = match open_db(&self.db_path) {
            Ok(conn) => conn,
            Err(err) => {
                error!("event=request module=api status=error operation={op_name} error_code=db_open_failed error={err}");
                return ApiResponse::failure(ErrorKind::OperationFailed, "operation failed");
            }
        };
        let repo = match SqliteKanbanRepository::try_new(&conn) {
            Ok(repo) => repo,
            Err(err) => {
                error!("event=request module=api status=error operation={op_name} error_code=repo_init_failed error={err}");
                return ApiResponse::failure(ErrorKind::OperationFailed, "operation failed");
            }
        };

        let caller = match self.gate.admit(credential, &repo) {
            Ok(caller) => caller,
            Err(err) => return KanbanError::from(err).into(),
        };

        let service = KanbanService::with_policy(repo, self.policy);
        let result = match operation {
            Operation::Boards => service.list_boards(&caller).map(Payload::Boards),
            Operation::Cards { column_id } => {
                service.list_cards(&caller, column_id).map(Payload::Cards)
            }
            Operation::CreateBoard { title } => {
                service.create_board(&caller, &title).map(Payload::Board)
            }
            Operation::DeleteBoard { board_id } => service
                .delete_board(&caller, board_id)
                .map(|()| Payload::Success(true)),
            Operation::CreateColumn { title, board_id } => service
                .create_column(&caller, &title, board_id)
                .map(Payload::Column),
            Operation::RenameColumn { column_id, title } => service
                .rename_column(&caller, column_id, &title)
                .map(Payload::Column),
            Operation::DeleteColumn { column_id } => service
                .delete_column(&caller, column_id)
                .map(|()| Payload::Success(true)),
            Operation::CreateCard { content, column_id } => service
                .create_card(&caller, &content, column_id)
                .map(Payload::Card),
            Operation::UpdateCard { card_id, content } => service
                .update_card(&caller, card_id, &content)
                .map(Payload::Card),
            Operation::MoveCard {
                card_id,
                new_column_id,
            } => service
                .move_card(&caller, card_id, new_column_id)
                .map(Payload::Card),
            Operation::DeleteCard { card_id } => service
                .delete_card(&caller, card_id)
                .map(|()| Payload::Success(true)),
        };

        match result {
            Ok(payload) => ApiResponse::success(payload),
            Err(err) => err.into(),
        }
    }

    /// Parses a JSON operation body, executes it and serializes the envelope.
    ///
    /// An unparseable body is answered with `ValidationError`.
    pub fn execute_json(&self, headers: &Headers, body: &str) -> String {
        let response = match serde_json::from_str::<Operation>(body) {
            Ok(operation) => self.execute(headers, operation),
            Err(err) => {
                warn!("event=request module=api status=rejected error_code=bad_request");
                ApiResponse::failure(ErrorKind::ValidationError, format!("invalid request: {err}"))
            }
        };
        to_json(&response)
    }
}

/// Serializes a response envelope.
pub fn to_json(response: &ApiResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        error!("event=response_encode module=api status=error error={err}");
        r#"{"ok":false,"error":{"kind":"OperationFailed","message":"operation failed"}}"#
            .to_string()
    })
}
