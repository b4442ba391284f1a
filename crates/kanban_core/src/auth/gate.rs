//! Header parsing and identity resolution.

use crate::auth::verifier::{TokenIdentity, TokenVerifier};
use crate::auth::{AuthError, AuthenticatedUser};
use crate::model::user::UserId;
use crate::repo::user_repo::UserRepository;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Inbound request headers, name to value.
pub type Headers = HashMap<String, String>;

static CREDENTIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S+) +(\S+)\s*$").expect("valid credential regex"));

/// Resolves bearer credentials to authenticated users.
///
/// Holds only the verifier; every call is independent.
pub struct AuthGate<V: TokenVerifier> {
    verifier: V,
}

impl<V: TokenVerifier> AuthGate<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Authenticates one request: `verify_credential` then `admit`.
    ///
    /// # Errors
    /// Every failure except `AuthError::Directory` means the caller is not
    /// authenticated. The store is only read, never written.
    pub fn authenticate<U: UserRepository>(
        &self,
        headers: &Headers,
        users: &U,
    ) -> Result<AuthenticatedUser, AuthError> {
        let credential = self.verify_credential(headers)?;
        self.admit(credential, users)
    }

    /// Checks the bearer credential without touching the store.
    pub fn verify_credential(&self, headers: &Headers) -> Result<VerifiedCredential, AuthError> {
        let result = self.resolve_credential(headers);
        if let Err(err) = &result {
            log_rejection(err);
        }
        result
    }

    /// Resolves a verified credential against the user directory.
    pub fn admit<U: UserRepository>(
        &self,
        credential: VerifiedCredential,
        users: &U,
    ) -> Result<AuthenticatedUser, AuthError> {
        let result = resolve_user(credential.user_id, users);
        match &result {
            Ok(user) => debug!(
                "event=auth module=auth status=ok user_id={}",
                user.user_id()
            ),
            Err(err) => log_rejection(err),
        }
        result
    }

    fn resolve_credential(&self, headers: &Headers) -> Result<VerifiedCredential, AuthError> {
        let header =
            find_header(headers, AUTHORIZATION_HEADER)?.ok_or(AuthError::MissingCredential)?;
        let token = parse_bearer_token(header).ok_or(AuthError::MalformedCredential)?;

        match self.verifier.verify(token).map_err(AuthError::InvalidToken)? {
            TokenIdentity::User(user_id) => Ok(VerifiedCredential { user_id }),
            TokenIdentity::Anonymous => Err(AuthError::AnonymousIdentity),
        }
    }
}

/// A token the verifier accepted for a named user, not yet checked against
/// the store. Only `AuthGate::verify_credential` produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedCredential {
    user_id: UserId,
}

impl VerifiedCredential {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

fn resolve_user<U: UserRepository>(
    user_id: UserId,
    users: &U,
) -> Result<AuthenticatedUser, AuthError> {
    let user = users
        .get_user(user_id)?
        .ok_or(AuthError::UnknownUser(user_id))?;
    if !user.is_active {
        return Err(AuthError::InactiveUser(user_id));
    }
    Ok(AuthenticatedUser::new(user.id))
}

fn log_rejection(err: &AuthError) {
    warn!(
        "event=auth module=auth status=rejected error_code={}",
        err.code()
    );
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for anything
/// that is not exactly one scheme and one token separated by spaces.
pub fn parse_bearer_token(value: &str) -> Option<&str> {
    let captures = CREDENTIAL_RE.captures(value)?;
    let scheme = captures.get(1)?.as_str();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    captures.get(2).map(|token| token.as_str())
}

/// Case-insensitive header lookup.
///
/// Two spellings of the same header are ambiguous and rejected.
fn find_header<'h>(headers: &'h Headers, name: &str) -> Result<Option<&'h str>, AuthError> {
    let mut matches = headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str());
    let first = matches.next();
    if matches.next().is_some() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(first)
}
