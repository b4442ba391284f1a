//! User reference kept by the board store.
//!
//! Users belong to the external identity provider. The store only keeps the
//! row that board ownership points at.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier issued by the identity provider.
pub type UserId = Uuid;

/// Minimal user row referenced by `boards.user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
    pub created_at: i64,
}
