//! Bearer-token authentication gate.
//!
//! # Responsibility
//! - Turn an inbound header map into an `AuthenticatedUser` or a rejection.
//! - Keep token verification behind the `TokenVerifier` seam.
//!
//! # Invariants
//! - `AuthenticatedUser` can only be minted by the gate, so every domain
//!   operation taking one has passed it.
//! - Credential checks (`AuthGate::verify_credential`) never touch the store;
//!   only `AuthGate::admit` reads the user directory.
//! - The gate keeps no per-request state and never writes to the store.
//! - Tokens are never logged.

mod gate;
mod verifier;

pub use gate::{
    parse_bearer_token, AuthGate, Headers, VerifiedCredential, AUTHORIZATION_HEADER,
};
pub use verifier::{StaticTokenVerifier, TokenIdentity, TokenRejection, TokenVerifier};

use crate::model::user::UserId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identity of a caller that passed the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticatedUser {
    user_id: UserId,
}

impl AuthenticatedUser {
    pub(crate) fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Stable user id used for ownership checks.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Reasons the gate rejects a request.
#[derive(Debug)]
pub enum AuthError {
    /// No `Authorization` header.
    MissingCredential,
    /// Header is not `<scheme> <token>` with the bearer scheme.
    MalformedCredential,
    /// Verifier rejected the token.
    InvalidToken(TokenRejection),
    /// Token is valid but names the anonymous/guest identity.
    AnonymousIdentity,
    /// Token names a user the store does not know.
    UnknownUser(UserId),
    /// Token names a deactivated user.
    InactiveUser(UserId),
    /// User lookup itself failed.
    Directory(RepoError),
}

impl AuthError {
    /// Stable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::InvalidToken(_) => "invalid_token",
            Self::AnonymousIdentity => "anonymous_identity",
            Self::UnknownUser(_) => "unknown_user",
            Self::InactiveUser(_) => "inactive_user",
            Self::Directory(_) => "directory_failure",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "no credential supplied"),
            Self::MalformedCredential => {
                write!(f, "authorization header must be `Bearer <token>`")
            }
            Self::InvalidToken(reason) => write!(f, "token rejected: {reason}"),
            Self::AnonymousIdentity => write!(f, "authentication required"),
            Self::UnknownUser(_) | Self::InactiveUser(_) => {
                write!(f, "token does not resolve to an active user")
            }
            Self::Directory(err) => write!(f, "user lookup failed: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Directory(value)
    }
}
