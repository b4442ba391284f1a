//! Column persistence.
//!
//! # Invariants
//! - Deleting a column removes its cards first, then the column, inside one
//!   transaction. No card outlives its column, even on a connection where the
//!   foreign-key cascade is not active.
//! - Column listing is deterministic: `created_at ASC, id ASC`.

use crate::model::board::BoardId;
use crate::model::column::{Column, ColumnId};
use crate::model::{normalize_title, now_epoch_ms};
use crate::repo::{ensure_board_exists, parse_uuid, RepoError, RepoResult, SqliteKanbanRepository};
use log::debug;
use rusqlite::{params, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const COLUMN_SELECT_SQL: &str = "SELECT id, board_id, title, created_at FROM columns";

/// Repository interface for column operations.
pub trait ColumnRepository {
    /// Creates an empty column, optionally owned by a board.
    fn create_column(&self, board_id: Option<BoardId>, title: &str) -> RepoResult<Column>;
    /// Loads one column by id.
    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>>;
    /// Lists the columns owned by one board.
    fn list_columns_for_board(&self, board_id: BoardId) -> RepoResult<Vec<Column>>;
    /// Replaces a column title.
    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<Column>;
    /// Deletes a column and its cards. Returns how many cards were removed.
    fn delete_column(&self, id: ColumnId) -> RepoResult<usize>;
}

impl ColumnRepository for SqliteKanbanRepository<'_> {
    fn create_column(&self, board_id: Option<BoardId>, title: &str) -> RepoResult<Column> {
        let column = Column {
            id: Uuid::new_v4(),
            board_id,
            title: normalize_title(title)?,
            created_at: now_epoch_ms(),
        };

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(board_id) = board_id {
            ensure_board_exists(&tx, board_id)?;
        }
        tx.execute(
            "INSERT INTO columns (id, board_id, title, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                column.id.to_string(),
                column.board_id.map(|value| value.to_string()),
                column.title.as_str(),
                column.created_at,
            ],
        )?;
        tx.commit()?;

        Ok(column)
    }

    fn get_column(&self, id: ColumnId) -> RepoResult<Option<Column>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COLUMN_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    fn list_columns_for_board(&self, board_id: BoardId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE board_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<Column> {
        let title = normalize_title(title)?;
        let changed = self.conn.execute(
            "UPDATE columns SET title = ?2 WHERE id = ?1;",
            params![id.to_string(), title.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::ColumnNotFound(id));
        }
        self.get_column(id)?.ok_or(RepoError::ColumnNotFound(id))
    }

    fn delete_column(&self, id: ColumnId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let removed_cards = tx.execute("DELETE FROM cards WHERE column_id = ?1;", [id.to_string()])?;
        let removed_columns = tx.execute("DELETE FROM columns WHERE id = ?1;", [id.to_string()])?;
        if removed_columns == 0 {
            // Dropping `tx` rolls back; nothing was removed for an unknown id.
            return Err(RepoError::ColumnNotFound(id));
        }

        tx.commit()?;
        debug!("event=column_delete module=repo status=ok column_id={id} removed_cards={removed_cards}");
        Ok(removed_cards)
    }
}

pub(crate) fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let id_text: String = row.get("id")?;
    let board_id = row
        .get::<_, Option<String>>("board_id")?
        .map(|value| parse_uuid(&value, "columns.board_id"))
        .transpose()?;

    Ok(Column {
        id: parse_uuid(&id_text, "columns.id")?,
        board_id,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
    })
}
