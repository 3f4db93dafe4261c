//! Stored credentials and the public profile of an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tama_core::{DomainResult, Entity, Owned, UserId, require_non_blank};

use crate::Role;

/// An argon2 PHC string (algorithm, parameters, salt and hash).
///
/// Never serialized and never printed; it can only be verified against a new
/// plaintext through [`crate::PasswordHasher::verify`].
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a PHC string read back from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// The record used to authenticate a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: UserId,
    pub user_name: String,
    pub password_hash: PasswordDigest,
    pub role: Role,
}

/// Public view of an identity. Never carries the password, hashed or plain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub profil_picture: Option<String>,
    pub gaming_time: i64,
    pub creation_date: DateTime<Utc>,
    pub last_connection_date: Option<DateTime<Utc>>,
    pub role: Role,
}

impl Entity for UserProfile {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.user_id
    }
}

/// A user record is owned by the user it describes.
impl Owned for UserProfile {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

/// Registration request.
///
/// Missing fields deserialize as empty strings so validation can report them
/// as invalid input instead of a body-parse failure.
#[derive(Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profil_picture: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("user_name", &self.user_name)?;
        require_non_blank("password", &self.password)?;
        require_non_blank("name", &self.name)?;
        require_non_blank("last_name", &self.last_name)?;
        require_non_blank("email", &self.email)?;
        Ok(())
    }
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("profil_picture", &self.profil_picture)
            .finish()
    }
}

/// A credential ready to be persisted (the password is already hashed).
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub user_name: String,
    pub password_hash: PasswordDigest,
    pub role: Role,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub profil_picture: Option<String>,
    pub creation_date: DateTime<Utc>,
}

impl NewCredential {
    /// Build the record for a freshly registered identity (default role).
    pub fn from_registration(
        new_user: NewUser,
        password_hash: PasswordDigest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_name: new_user.user_name.trim().to_string(),
            password_hash,
            role: Role::default(),
            name: new_user.name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            email: new_user.email.trim().to_string(),
            profil_picture: new_user.profil_picture,
            creation_date: now,
        }
    }
}
