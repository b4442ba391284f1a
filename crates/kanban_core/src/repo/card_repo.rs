//! Card persistence.
//!
//! # Invariants
//! - A card is only ever written with a `column_id` verified inside the same
//!   transaction.
//! - `updated_at` is written as `MAX(updated_at, now)`, so it never moves
//!   backwards even if the wall clock does.
//! - Card listing is deterministic: `created_at ASC, id ASC`.

use crate::model::card::{validate_content, Card, CardId};
use crate::model::column::ColumnId;
use crate::model::now_epoch_ms;
use crate::repo::{
    ensure_card_exists, ensure_column_exists, parse_uuid, RepoError, RepoResult,
    SqliteKanbanRepository,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CARD_SELECT_SQL: &str = "SELECT id, column_id, content, created_at, updated_at FROM cards";

/// Repository interface for card operations.
pub trait CardRepository {
    /// Creates a card in an existing column.
    fn create_card(&self, column_id: ColumnId, content: &str) -> RepoResult<Card>;
    /// Loads one card by id.
    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>>;
    /// Lists the cards whose column reference equals `column_id`.
    ///
    /// An unknown column yields an empty list.
    fn list_cards_by_column(&self, column_id: ColumnId) -> RepoResult<Vec<Card>>;
    /// Replaces card content and refreshes `updated_at`.
    fn update_card_content(&self, id: CardId, content: &str) -> RepoResult<Card>;
    /// Reassigns a card to another existing column.
    fn move_card(&self, id: CardId, destination: ColumnId) -> RepoResult<Card>;
    /// Deletes one card.
    fn delete_card(&self, id: CardId) -> RepoResult<()>;
}

impl CardRepository for SqliteKanbanRepository<'_> {
    fn create_card(&self, column_id: ColumnId, content: &str) -> RepoResult<Card> {
        let card = Card::new(column_id, content, now_epoch_ms());
        card.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_column_exists(&tx, column_id)?;
        tx.execute(
            "INSERT INTO cards (id, column_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                card.id.to_string(),
                card.column_id.to_string(),
                card.content.as_str(),
                card.created_at,
                card.updated_at,
            ],
        )?;
        tx.commit()?;

        Ok(card)
    }

    fn get_card(&self, id: CardId) -> RepoResult<Option<Card>> {
        load_card(self.conn, id)
    }

    fn list_cards_by_column(&self, column_id: ColumnId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL}
             WHERE column_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([column_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    fn update_card_content(&self, id: CardId, content: &str) -> RepoResult<Card> {
        validate_content(content)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE cards
             SET content = ?2,
                 updated_at = MAX(updated_at, ?3)
             WHERE id = ?1;",
            params![id.to_string(), content, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(id));
        }
        let card = load_card(&tx, id)?.ok_or(RepoError::CardNotFound(id))?;
        tx.commit()?;

        Ok(card)
    }

    fn move_card(&self, id: CardId, destination: ColumnId) -> RepoResult<Card> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_card_exists(&tx, id)?;
        // Destination is checked before the card row is touched.
        ensure_column_exists(&tx, destination)?;

        tx.execute(
            "UPDATE cards
             SET column_id = ?2,
                 updated_at = MAX(updated_at, ?3)
             WHERE id = ?1;",
            params![id.to_string(), destination.to_string(), now_epoch_ms()],
        )?;
        let card = load_card(&tx, id)?.ok_or(RepoError::CardNotFound(id))?;
        tx.commit()?;

        Ok(card)
    }

    fn delete_card(&self, id: CardId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::CardNotFound(id));
        }
        Ok(())
    }
}

fn load_card(conn: &Connection, id: CardId) -> RepoResult<Option<Card>> {
    let mut stmt = conn.prepare(&format!("{CARD_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_card_row(row)?));
    }
    Ok(None)
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let id_text: String = row.get("id")?;
    let column_text: String = row.get("column_id")?;

    let card = Card {
        id: parse_uuid(&id_text, "cards.id")?,
        column_id: parse_uuid(&column_text, "cards.column_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    card.validate()
        .map_err(|err| RepoError::InvalidData(format!("card {}: {err}", card.id)))?;
    Ok(card)
}
