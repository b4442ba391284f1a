//! Environment-driven facade configuration.
//!
//! # Keys
//! - `KANBAN_DB_PATH`: SQLite file, defaults to `<temp_dir>/kanban.sqlite3`.
//! - `KANBAN_LOG_LEVEL`: defaults to the build-mode level.
//! - `KANBAN_LOG_DIR`: absolute directory; file logging stays off when unset.
//! - `KANBAN_TOKENS`: `token=user_uuid` pairs, comma separated.
//! - `KANBAN_ACCESS_POLICY`: `authenticated` (default) or `owner`.
//!
//! Blank values count as unset.

use kanban_core::{default_log_level, AccessPolicy, StaticTokenVerifier};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_KEY: &str = "KANBAN_DB_PATH";
pub const LOG_LEVEL_KEY: &str = "KANBAN_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "KANBAN_LOG_DIR";
pub const TOKENS_KEY: &str = "KANBAN_TOKENS";
pub const ACCESS_POLICY_KEY: &str = "KANBAN_ACCESS_POLICY";

const DEFAULT_DB_FILE_NAME: &str = "kanban.sqlite3";

/// A configuration value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl Error for ConfigError {}

/// Resolved facade configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub tokens: StaticTokenVerifier,
    pub access_policy: AccessPolicy,
}

impl ApiConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a key to its raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let db_path = value(DB_PATH_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = value(LOG_LEVEL_KEY).unwrap_or_else(|| default_log_level().to_string());

        let tokens = match value(TOKENS_KEY) {
            Some(raw) => raw.parse().map_err(|message| ConfigError {
                key: TOKENS_KEY,
                message,
            })?,
            None => StaticTokenVerifier::new(),
        };

        let access_policy = match value(ACCESS_POLICY_KEY) {
            Some(raw) => AccessPolicy::parse(&raw).ok_or_else(|| ConfigError {
                key: ACCESS_POLICY_KEY,
                message: format!("expected `authenticated` or `owner`, got `{raw}`"),
            })?,
            None => AccessPolicy::default(),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir: value(LOG_DIR_KEY),
            tokens,
            access_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, ACCESS_POLICY_KEY, DB_PATH_KEY, LOG_DIR_KEY, TOKENS_KEY};
    use kanban_core::{AccessPolicy, TokenIdentity, TokenVerifier};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, super::ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = config_from(&[(LOG_DIR_KEY, "   ")]).unwrap();
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("kanban.sqlite3")
        );
        assert_eq!(config.log_dir, None);
        assert!(config.tokens.is_empty());
        assert_eq!(config.access_policy, AccessPolicy::AuthenticatedOnly);
    }

    #[test]
    fn reads_explicit_values() {
        let user_id = Uuid::new_v4();
        let tokens = format!("abc={user_id}");
        let config = config_from(&[
            (DB_PATH_KEY, "/var/lib/kanban/board.db"),
            (TOKENS_KEY, tokens.as_str()),
            (ACCESS_POLICY_KEY, "owner"),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/kanban/board.db"));
        assert_eq!(config.access_policy, AccessPolicy::OwnerOnly);
        assert_eq!(config.tokens.verify("abc"), Ok(TokenIdentity::User(user_id)));
    }

    #[test]
    fn rejects_bad_policy_and_token_table() {
        let err = config_from(&[(ACCESS_POLICY_KEY, "root")]).unwrap_err();
        assert_eq!(err.key, ACCESS_POLICY_KEY);

        let err = config_from(&[(TOKENS_KEY, "broken")]).unwrap_err();
        assert_eq!(err.key, TOKENS_KEY);
        assert!(err.to_string().starts_with("invalid KANBAN_TOKENS"));
    }
}
