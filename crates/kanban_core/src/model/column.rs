//! Column model.

use crate::model::board::BoardId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ColumnId = Uuid;

/// Named grouping of cards.
///
/// `board_id` is `None` for a free-standing column that no board owns yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: Option<BoardId>,
    pub title: String,
    pub created_at: i64,
}
