//! Storage collaborator interfaces consumed by the authentication core.
//!
//! Atomicity (check-then-insert on registration) is the implementation's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use tama_core::UserId;

use crate::{Credential, NewCredential, UserProfile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique field (user name, email) is already taken.
    #[error("duplicate identifier: {0}")]
    Duplicate(String),

    #[error("not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Credential lookup and persistence.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_identifier(&self, user_name: &str) -> Result<Option<Credential>, StoreError>;

    /// Persist a new credential, failing with [`StoreError::Duplicate`] on conflict.
    async fn insert(&self, credential: NewCredential) -> Result<UserProfile, StoreError>;

    /// Best-effort bookkeeping; callers must not fail a login on error.
    async fn update_last_seen(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Resolves the owner of a resource for ownership-gated operations.
#[async_trait::async_trait]
pub trait OwnershipLookup<Id: Send + 'static>: Send + Sync {
    async fn find_owner(&self, id: Id) -> Result<Option<UserId>, StoreError>;
}

#[async_trait::async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_by_identifier(&self, user_name: &str) -> Result<Option<Credential>, StoreError> {
        (**self).find_by_identifier(user_name).await
    }

    async fn insert(&self, credential: NewCredential) -> Result<UserProfile, StoreError> {
        (**self).insert(credential).await
    }

    async fn update_last_seen(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).update_last_seen(user_id, at).await
    }
}

#[async_trait::async_trait]
impl<Id, S> OwnershipLookup<Id> for Arc<S>
where
    Id: Send + 'static,
    S: OwnershipLookup<Id> + ?Sized,
{
    async fn find_owner(&self, id: Id) -> Result<Option<UserId>, StoreError> {
        (**self).find_owner(id).await
    }
}
