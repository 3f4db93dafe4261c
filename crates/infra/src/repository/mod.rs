//! Repository traits for the resource layer.
//!
//! Each extends the collaborator interface the auth core consumes, so one
//! store value can be handed to both the core and the route handlers.

use tama_auth::{CredentialStore, OwnershipLookup, StoreError, UserProfile};
use tama_core::{TamaId, UserId};

use crate::models::{NewRace, NewTama, Race, Tama, TamaUpdate, UserUpdate};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryStore;

#[async_trait::async_trait]
pub trait UserRepository: CredentialStore {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: UserId, update: UserUpdate)
    -> Result<Option<UserProfile>, StoreError>;

    /// Removes the user and every tama it owns. Returns `false` if absent.
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait TamaRepository: OwnershipLookup<TamaId> {
    /// All tamas, or only those owned by `owner`.
    async fn list_tamas(&self, owner: Option<UserId>) -> Result<Vec<Tama>, StoreError>;

    async fn get_tama(&self, id: TamaId) -> Result<Option<Tama>, StoreError>;

    async fn create_tama(&self, owner: UserId, tama: NewTama) -> Result<Tama, StoreError>;

    async fn update_tama(&self, id: TamaId, update: TamaUpdate) -> Result<Option<Tama>, StoreError>;

    async fn delete_tama(&self, id: TamaId) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait RaceRepository: Send + Sync {
    async fn list_races(&self) -> Result<Vec<Race>, StoreError>;

    async fn create_race(&self, race: NewRace) -> Result<Race, StoreError>;
}
