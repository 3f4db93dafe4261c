//! Registration and login: hash-on-write, verify-on-read, token on success.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    AuthError, CredentialStore, NewCredential, NewUser, PasswordDigest, PasswordHasher,
    TokenCodec, UserProfile,
};

/// Orchestrates credential checks against a [`CredentialStore`].
pub struct Authenticator<S> {
    store: S,
    hasher: PasswordHasher,
    codec: Arc<dyn TokenCodec>,
    // Verified against when the identifier is unknown, so both failure paths cost one hash.
    decoy: PasswordDigest,
}

impl<S> Authenticator<S>
where
    S: CredentialStore,
{
    pub fn new(store: S, hasher: PasswordHasher, codec: Arc<dyn TokenCodec>) -> Result<Self, AuthError> {
        let decoy = hasher.hash("decoy-password-never-matches")?;
        Ok(Self {
            store,
            hasher,
            codec,
            decoy,
        })
    }

    pub fn codec(&self) -> &Arc<dyn TokenCodec> {
        &self.codec
    }

    /// Register a new identity with the default role.
    pub async fn register(&self, new_user: NewUser, now: DateTime<Utc>) -> Result<UserProfile, AuthError> {
        new_user.validate()?;

        if self
            .store
            .find_by_identifier(new_user.user_name.trim())
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateIdentifier);
        }

        let digest = self.hasher.hash(&new_user.password)?;
        let credential = NewCredential::from_registration(new_user, digest, now);
        let profile = self.store.insert(credential).await?;

        tracing::info!(user_id = %profile.user_id, "user registered");
        Ok(profile)
    }

    /// Verify a user name / password pair and issue a session token.
    ///
    /// The token embeds the role as stored right now; role changes made later
    /// are not visible to requests carrying this token.
    pub async fn login(
        &self,
        user_name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let credential = match self.store.find_by_identifier(user_name.trim()).await? {
            Some(credential) => credential,
            None => {
                let _ = self.hasher.verify(password, &self.decoy);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if let Err(e) = self.store.update_last_seen(credential.id, now).await {
            tracing::warn!(user_id = %credential.id, error = %e, "failed to record last connection");
        }

        let token = self.codec.issue(credential.id, credential.role, now)?;
        tracing::info!(user_id = %credential.id, role = %credential.role, "login succeeded");
        Ok(token)
    }

    /// Re-hash a replacement password. The only way a stored secret changes.
    pub fn hash_password(&self, plaintext: &str) -> Result<PasswordDigest, AuthError> {
        tama_core::require_non_blank("password", plaintext)?;
        Ok(self.hasher.hash(plaintext)?)
    }
}
