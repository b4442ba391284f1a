//! Token verification seam.
//!
//! Issuing and signing tokens belongs to the identity provider. The gate only
//! needs "verify token -> identity", which is what `TokenVerifier` models.

use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Identity carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenIdentity {
    /// Token was issued to a real user.
    User(UserId),
    /// Token is valid but represents a guest session.
    Anonymous,
}

/// Why a verifier refused a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Token is not recognised or its signature does not verify.
    Unknown,
    /// Token was valid once but is past its expiry.
    Expired,
}

impl Display for TokenRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "token is not recognised"),
            Self::Expired => write!(f, "token has expired"),
        }
    }
}

/// Verifies an opaque bearer token.
pub trait TokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenIdentity, TokenRejection>;
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for Box<T> {
    fn verify(&self, token: &str) -> Result<TokenIdentity, TokenRejection> {
        (**self).verify(token)
    }
}

#[derive(Debug, Clone)]
struct StaticToken {
    identity: TokenIdentity,
    expires_at: Option<i64>,
}

/// In-memory token table standing in for an external identity provider.
///
/// Parses from `token=subject` pairs separated by commas, where `subject` is
/// a user UUID or `anonymous`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, StaticToken>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a non-expiring token for `user_id`.
    pub fn with_user_token(self, token: impl Into<String>, user_id: UserId) -> Self {
        self.with_token(token, TokenIdentity::User(user_id), None)
    }

    /// Registers a token for `user_id` that stops verifying at `expires_at`
    /// (epoch milliseconds).
    pub fn with_expiring_user_token(
        self,
        token: impl Into<String>,
        user_id: UserId,
        expires_at: i64,
    ) -> Self {
        self.with_token(token, TokenIdentity::User(user_id), Some(expires_at))
    }

    /// Registers a token that verifies as the guest identity.
    pub fn with_anonymous_token(self, token: impl Into<String>) -> Self {
        self.with_token(token, TokenIdentity::Anonymous, None)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn with_token(
        mut self,
        token: impl Into<String>,
        identity: TokenIdentity,
        expires_at: Option<i64>,
    ) -> Self {
        self.tokens.insert(
            token.into(),
            StaticToken {
                identity,
                expires_at,
            },
        );
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenIdentity, TokenRejection> {
        let entry = self.tokens.get(token).ok_or(TokenRejection::Unknown)?;
        if let Some(expires_at) = entry.expires_at {
            if now_epoch_ms() >= expires_at {
                return Err(TokenRejection::Expired);
            }
        }
        Ok(entry.identity)
    }
}

impl FromStr for StaticTokenVerifier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut verifier = Self::new();
        for pair in value.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let (token, subject) = pair
                .split_once('=')
                .ok_or_else(|| format!("token entry `{pair}` must be `token=subject`"))?;
            let (token, subject) = (token.trim(), subject.trim());
            if token.is_empty() {
                return Err("token entry has an empty token".to_string());
            }

            verifier = if subject.eq_ignore_ascii_case(ANONYMOUS_SUBJECT) {
                verifier.with_anonymous_token(token)
            } else {
                let user_id = Uuid::parse_str(subject)
                    .map_err(|_| format!("token subject `{subject}` is not a user UUID"))?;
                verifier.with_user_token(token, user_id)
            };
        }
        Ok(verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::{StaticTokenVerifier, TokenIdentity, TokenRejection, TokenVerifier};
    use uuid::Uuid;

    #[test]
    fn verifies_registered_user_token() {
        let user_id = Uuid::new_v4();
        let verifier = StaticTokenVerifier::new().with_user_token("t1", user_id);
        assert_eq!(verifier.verify("t1"), Ok(TokenIdentity::User(user_id)));
        assert_eq!(verifier.verify("t2"), Err(TokenRejection::Unknown));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier =
            StaticTokenVerifier::new().with_expiring_user_token("old", Uuid::new_v4(), 1);
        assert_eq!(verifier.verify("old"), Err(TokenRejection::Expired));
    }

    #[test]
    fn parses_token_table() {
        let user_id = Uuid::new_v4();
        let verifier: StaticTokenVerifier = format!(" alpha={user_id} , guest=anonymous,")
            .parse()
            .expect("token table should parse");
        assert_eq!(verifier.len(), 2);
        assert_eq!(verifier.verify("alpha"), Ok(TokenIdentity::User(user_id)));
        assert_eq!(verifier.verify("guest"), Ok(TokenIdentity::Anonymous));
    }

    #[test]
    fn rejects_malformed_token_table() {
        let err = "alpha".parse::<StaticTokenVerifier>().unwrap_err();
        assert!(err.contains("token=subject"));

        let err = "alpha=not-a-uuid".parse::<StaticTokenVerifier>().unwrap_err();
        assert!(err.contains("UUID"));
    }
}
