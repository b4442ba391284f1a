//! Board/column/card domain model.
//!
//! # Responsibility
//! - Define the records persisted by the board store.
//! - Own input validation shared by repositories and services.
//!
//! # Invariants
//! - Ownership is exclusive: a card has exactly one column, a column has at
//!   most one board, a board has exactly one user.
//! - Timestamps are Unix epoch milliseconds and `updated_at >= created_at`.

pub mod board;
pub mod card;
pub mod column;
pub mod user;

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Upper bound for board and column titles, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Input validation failures for board/column/card fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming.
    BlankTitle,
    /// Title exceeds `MAX_TITLE_CHARS`.
    TitleTooLong { max: usize, actual: usize },
    /// Card content is empty after trimming.
    BlankContent,
    /// `updated_at` is earlier than `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title must be at most {max} characters, got {actual}")
            }
            Self::BlankContent => write!(f, "card content must not be blank"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims a board or column title and checks its length.
pub fn normalize_title(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    let actual = trimmed.chars().count();
    if actual > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    epoch_ms_at(SystemTime::now())
}

/// Milliseconds between the Unix epoch and `time`.
///
/// Instants before the epoch are negative. Values beyond `i64` saturate.
fn epoch_ms_at(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(err) => {
            warn!("event=clock_read module=model status=error error_code=clock_before_epoch");
            i64::try_from(err.duration().as_millis()).map_or(i64::MIN, |ms| -ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{epoch_ms_at, normalize_title, ValidationError, MAX_TITLE_CHARS};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn normalize_title_trims_whitespace() {
        assert_eq!(normalize_title("  Todo \n").unwrap(), "Todo");
    }

    #[test]
    fn normalize_title_rejects_blank() {
        assert_eq!(normalize_title("   "), Err(ValidationError::BlankTitle));
    }

    #[test]
    fn normalize_title_counts_chars_not_bytes() {
        let at_limit = "é".repeat(MAX_TITLE_CHARS);
        assert!(normalize_title(&at_limit).is_ok());

        let over = "x".repeat(MAX_TITLE_CHARS + 1);
        assert_eq!(
            normalize_title(&over),
            Err(ValidationError::TitleTooLong {
                max: MAX_TITLE_CHARS,
                actual: MAX_TITLE_CHARS + 1
            })
        );
    }

    #[test]
    fn epoch_ms_is_signed_around_the_epoch() {
        assert_eq!(epoch_ms_at(UNIX_EPOCH + Duration::from_millis(1_500)), 1_500);
        assert_eq!(epoch_ms_at(UNIX_EPOCH), 0);
        assert_eq!(epoch_ms_at(UNIX_EPOCH - Duration::from_millis(250)), -250);
    }
}
