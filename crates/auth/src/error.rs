//! Error taxonomy of the authentication/authorization boundary.

use thiserror::Error;

use tama_core::DomainError;

use crate::{HashError, StoreError, TokenError};

/// Failures surfaced to callers of the auth core.
///
/// Variants are coarse: none of them says *which* part of a
/// compound check failed (unknown user vs wrong password, expired vs forged).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("identifier already exists")]
    DuplicateIdentifier,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("forbidden")]
    Forbidden,

    #[error("storage error: {0}")]
    Storage(String),

    /// Hashing or signing failed (server fault).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(_) => AuthError::DuplicateIdentifier,
            StoreError::NotFound => AuthError::Storage("record vanished".to_string()),
            StoreError::Backend(msg) => AuthError::Storage(msg),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AuthError::InvalidInput(msg),
            DomainError::Conflict(_) => AuthError::DuplicateIdentifier,
            DomainError::NotFound => AuthError::Storage("record vanished".to_string()),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(value: HashError) -> Self {
        AuthError::Internal(value.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}
