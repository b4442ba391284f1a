//! User reference rows.
//!
//! Users are provisioned by whatever fronts the identity provider; the store
//! only needs them so board ownership has something to cascade from.

use crate::model::now_epoch_ms;
use crate::model::user::{User, UserId};
use crate::repo::{bool_to_int, parse_uuid, RepoError, RepoResult, SqliteKanbanRepository};
use rusqlite::{params, Row};
use uuid::Uuid;

/// Repository interface for user reference rows.
pub trait UserRepository {
    /// Inserts an active user with a generated id.
    fn create_user(&self, username: &str) -> RepoResult<User>;
    /// Inserts a user under an id the identity provider already issued.
    fn create_user_with_id(&self, id: UserId, username: &str) -> RepoResult<User>;
    /// Loads one user by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Activates or deactivates a user.
    fn set_user_active(&self, id: UserId, is_active: bool) -> RepoResult<()>;
    /// Deletes a user; boards cascade through the foreign key.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

impl UserRepository for SqliteKanbanRepository<'_> {
    fn create_user(&self, username: &str) -> RepoResult<User> {
        self.create_user_with_id(Uuid::new_v4(), username)
    }

    fn create_user_with_id(&self, id: UserId, username: &str) -> RepoResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(RepoError::InvalidData("username must not be blank".to_string()));
        }

        let user = User {
            id,
            username: username.to_string(),
            is_active: true,
            created_at: now_epoch_ms(),
        };
        self.conn.execute(
            "INSERT INTO users (id, username, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                bool_to_int(user.is_active),
                user.created_at,
            ],
        )?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, is_active, created_at
             FROM users
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn set_user_active(&self, id: UserId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_active = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(is_active)],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_active value `{other}` in users.is_active"
            )));
        }
    };

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        username: row.get("username")?,
        is_active,
        created_at: row.get("created_at")?,
    })
}
