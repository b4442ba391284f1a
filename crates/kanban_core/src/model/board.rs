//! Board model and its nested read projection.

use crate::model::card::Card;
use crate::model::column::Column;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BoardId = Uuid;

/// Top-level container owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub user_id: UserId,
    pub title: String,
    pub created_at: i64,
}

/// Board with its columns and their cards, as returned by board listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnView>,
}

/// Column with its cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<Card>,
}
