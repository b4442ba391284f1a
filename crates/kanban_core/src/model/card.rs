//! Card model.
//!
//! # Invariants
//! - `column_id` always points at an existing column while the card exists.
//! - `created_at` is set once; `updated_at` only moves forward.

use crate::model::column::ColumnId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CardId = Uuid;

/// Unit of work with free-text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    /// Stored verbatim.
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    /// Builds a fresh card stamped with `now` for both timestamps.
    pub fn new(column_id: ColumnId, content: impl Into<String>, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            column_id,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks content and timestamp ordering.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.content)?;
        if self.updated_at < self.created_at {
            return Err(ValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Rejects content that is empty after trimming.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::BlankContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Card;
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn new_card_has_equal_timestamps() {
        let card = Card::new(Uuid::new_v4(), "write spec", 1_700_000_000_000);
        assert_eq!(card.created_at, card.updated_at);
        assert!(card.validate().is_ok());
    }

    #[test]
    fn validate_rejects_reversed_timestamps() {
        let mut card = Card::new(Uuid::new_v4(), "x", 2_000);
        card.updated_at = 1_000;
        assert!(matches!(
            card.validate(),
            Err(ValidationError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn validate_rejects_blank_content() {
        let card = Card::new(Uuid::new_v4(), " \t", 1);
        assert_eq!(card.validate(), Err(ValidationError::BlankContent));
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let card = Card::new(Uuid::nil(), "body", 5);
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["column_id"], Uuid::nil().to_string());
        assert_eq!(value["created_at"], 5);
    }
}
