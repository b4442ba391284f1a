//! Board persistence and nested board reads.
//!
//! # Invariants
//! - A board is only inserted for an existing user.
//! - Deleting a board removes its cards, then its columns, then the board, in
//!   one transaction.
//! - Nested reads run inside one read transaction so a listing never mixes
//!   states from before and after a concurrent write.

use crate::model::board::{Board, BoardId, BoardView, ColumnView};
use crate::model::user::UserId;
use crate::model::{normalize_title, now_epoch_ms};
use crate::repo::card_repo::CardRepository;
use crate::repo::column_repo::ColumnRepository;
use crate::repo::{parse_uuid, row_exists, RepoError, RepoResult, SqliteKanbanRepository};
use log::debug;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const BOARD_SELECT_SQL: &str = "SELECT id, user_id, title, created_at FROM boards";

/// Repository interface for board operations.
pub trait BoardRepository {
    /// Creates a board owned by `user_id`.
    fn create_board(&self, user_id: UserId, title: &str) -> RepoResult<Board>;
    /// Loads one board by id.
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    /// Lists boards owned by one user, oldest first.
    fn list_boards_for_user(&self, user_id: UserId) -> RepoResult<Vec<Board>>;
    /// Lists boards owned by one user with their columns and cards.
    fn list_board_views_for_user(&self, user_id: UserId) -> RepoResult<Vec<BoardView>>;
    /// Deletes a board with its columns and their cards.
    fn delete_board(&self, id: BoardId) -> RepoResult<()>;
}

impl BoardRepository for SqliteKanbanRepository<'_> {
    fn create_board(&self, user_id: UserId, title: &str) -> RepoResult<Board> {
        let board = Board {
            id: Uuid::new_v4(),
            user_id,
            title: normalize_title(title)?,
            created_at: now_epoch_ms(),
        };

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "SELECT 1 FROM users WHERE id = ?1;", user_id)? {
            return Err(RepoError::UserNotFound(user_id));
        }
        tx.execute(
            "INSERT INTO boards (id, user_id, title, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                board.id.to_string(),
                board.user_id.to_string(),
                board.title.as_str(),
                board.created_at,
            ],
        )?;
        tx.commit()?;

        Ok(board)
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOARD_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_board_row(row)?));
        }
        Ok(None)
    }

    fn list_boards_for_user(&self, user_id: UserId) -> RepoResult<Vec<Board>> {
        load_boards_for_user(self.conn, user_id)
    }

    fn list_board_views_for_user(&self, user_id: UserId) -> RepoResult<Vec<BoardView>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let snapshot = SqliteKanbanRepository { conn: &tx };

        let mut views = Vec::new();
        for board in load_boards_for_user(&tx, user_id)? {
            let mut columns = Vec::new();
            for column in snapshot.list_columns_for_board(board.id)? {
                let cards = snapshot.list_cards_by_column(column.id)?;
                columns.push(ColumnView { column, cards });
            }
            views.push(BoardView { board, columns });
        }

        tx.commit()?;
        Ok(views)
    }

    fn delete_board(&self, id: BoardId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let removed_cards = tx.execute(
            "DELETE FROM cards
             WHERE column_id IN (SELECT id FROM columns WHERE board_id = ?1);",
            [id.to_string()],
        )?;
        let removed_columns =
            tx.execute("DELETE FROM columns WHERE board_id = ?1;", [id.to_string()])?;
        let removed_boards = tx.execute("DELETE FROM boards WHERE id = ?1;", [id.to_string()])?;
        if removed_boards == 0 {
            return Err(RepoError::BoardNotFound(id));
        }

        tx.commit()?;
        debug!(
            "event=board_delete module=repo status=ok board_id={id} removed_columns={removed_columns} removed_cards={removed_cards}"
        );
        Ok(())
    }
}

fn load_boards_for_user(conn: &Connection, user_id: UserId) -> RepoResult<Vec<Board>> {
    let mut stmt = conn.prepare(&format!(
        "{BOARD_SELECT_SQL}
         WHERE user_id = ?1
         ORDER BY created_at ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([user_id.to_string()])?;
    let mut boards = Vec::new();
    while let Some(row) = rows.next()? {
        boards.push(parse_board_row(row)?);
    }
    Ok(boards)
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;

    Ok(Board {
        id: parse_uuid(&id_text, "boards.id")?,
        user_id: parse_uuid(&user_text, "boards.user_id")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
    })
}
