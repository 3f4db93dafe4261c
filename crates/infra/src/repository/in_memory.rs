use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use tama_auth::{
    Credential, CredentialStore, NewCredential, OwnershipLookup, PasswordDigest, StoreError,
    UserProfile,
};
use tama_core::{RaceId, TamaId, UserId};

use super::{RaceRepository, TamaRepository, UserRepository};
use crate::models::{NewRace, NewTama, Race, Tama, TamaUpdate, UserUpdate};

#[derive(Debug, Clone)]
struct UserRow {
    profile: UserProfile,
    password_hash: PasswordDigest,
}

impl UserRow {
    fn credential(&self) -> Credential {
        Credential {
            id: self.profile.user_id,
            user_name: self.profile.user_name.clone(),
            password_hash: self.password_hash.clone(),
            role: self.profile.role,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, UserRow>,
    tamas: BTreeMap<TamaId, Tama>,
    races: BTreeMap<RaceId, Race>,
    next_user: i64,
    next_tama: i64,
    next_race: i64,
}

impl State {
    /// Describes the first unique field another user already holds, skipping `except`.
    fn clash(&self, user_name: &str, email: &str, except: Option<UserId>) -> Option<String> {
        self.users
            .values()
            .filter(|row| Some(row.profile.user_id) != except)
            .find_map(|row| {
                if row.profile.user_name == user_name {
                    Some(format!("user_name {user_name}"))
                } else if row.profile.email == email {
                    Some(format!("email {email}"))
                } else {
                    None
                }
            })
    }
}

/// Process-local store implementing every repository trait.
///
/// Intended for tests/dev. Ids are assigned from per-table counters starting
/// at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_identifier(&self, user_name: &str) -> Result<Option<Credential>, StoreError> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .find(|row| row.profile.user_name == user_name)
            .map(UserRow::credential))
    }

    async fn insert(&self, credential: NewCredential) -> Result<UserProfile, StoreError> {
        // Uniqueness check and insert happen under the same guard.
        let mut state = self.write()?;
        if let Some(field) = state.clash(&credential.user_name, &credential.email, None) {
            return Err(StoreError::Duplicate(field));
        }

        state.next_user += 1;
        let user_id = UserId::new(state.next_user);
        let profile = UserProfile {
            user_id,
            name: credential.name,
            last_name: credential.last_name,
            user_name: credential.user_name,
            email: credential.email,
            profil_picture: credential.profil_picture,
            gaming_time: 0,
            creation_date: credential.creation_date,
            last_connection_date: None,
            role: credential.role,
        };
        state.users.insert(
            user_id,
            UserRow {
                profile: profile.clone(),
                password_hash: credential.password_hash,
            },
        );
        Ok(profile)
    }

    async fn update_last_seen(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let row = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        row.profile.last_connection_date = Some(at);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().map(|row| row.profile.clone()).collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let state = self.read()?;
        Ok(state.users.get(&id).map(|row| row.profile.clone()))
    }

    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        let mut state = self.write()?;
        let Some(current) = state.users.get(&id) else {
            return Ok(None);
        };

        let user_name = update
            .user_name
            .clone()
            .unwrap_or_else(|| current.profile.user_name.clone());
        let email = update
            .email
            .clone()
            .unwrap_or_else(|| current.profile.email.clone());
        if let Some(field) = state.clash(&user_name, &email, Some(id)) {
            return Err(StoreError::Duplicate(field));
        }

        let Some(row) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        let profile = &mut row.profile;
        profile.user_name = user_name;
        profile.email = email;
        if let Some(v) = update.name {
            profile.name = v;
        }
        if let Some(v) = update.last_name {
            profile.last_name = v;
        }
        if let Some(v) = update.profil_picture {
            profile.profil_picture = Some(v);
        }
        if let Some(v) = update.gaming_time {
            profile.gaming_time = v;
        }
        if let Some(v) = update.role {
            profile.role = v;
        }
        if let Some(v) = update.password_hash {
            row.password_hash = v;
        }
        Ok(Some(row.profile.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        let before = state.tamas.len();
        state.tamas.retain(|_, tama| tama.user_id != id);
        tracing::debug!(user_id = %id, tamas_removed = before - state.tamas.len(), "user deleted");
        Ok(true)
    }
}

#[async_trait::async_trait]
impl OwnershipLookup<TamaId> for InMemoryStore {
    async fn find_owner(&self, id: TamaId) -> Result<Option<UserId>, StoreError> {
        let state = self.read()?;
        Ok(state.tamas.get(&id).map(|tama| tama.user_id))
    }
}

#[async_trait::async_trait]
impl TamaRepository for InMemoryStore {
    async fn list_tamas(&self, owner: Option<UserId>) -> Result<Vec<Tama>, StoreError> {
        let state = self.read()?;
        Ok(state
            .tamas
            .values()
            .filter(|tama| owner.is_none_or(|owner| tama.user_id == owner))
            .cloned()
            .collect())
    }

    async fn get_tama(&self, id: TamaId) -> Result<Option<Tama>, StoreError> {
        let state = self.read()?;
        Ok(state.tamas.get(&id).cloned())
    }

    async fn create_tama(&self, owner: UserId, tama: NewTama) -> Result<Tama, StoreError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&owner) {
            return Err(StoreError::NotFound);
        }
        state.next_tama += 1;
        let tama = tama.into_tama(TamaId::new(state.next_tama), owner);
        state.tamas.insert(tama.tama_id, tama.clone());
        Ok(tama)
    }

    async fn update_tama(&self, id: TamaId, update: TamaUpdate) -> Result<Option<Tama>, StoreError> {
        let mut state = self.write()?;
        Ok(state.tamas.get_mut(&id).map(|tama| {
            update.apply(tama);
            tama.clone()
        }))
    }

    async fn delete_tama(&self, id: TamaId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(state.tamas.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl RaceRepository for InMemoryStore {
    async fn list_races(&self) -> Result<Vec<Race>, StoreError> {
        let state = self.read()?;
        Ok(state.races.values().cloned().collect())
    }

    async fn create_race(&self, race: NewRace) -> Result<Race, StoreError> {
        let mut state = self.write()?;
        if state.races.values().any(|r| r.name == race.name) {
            return Err(StoreError::Duplicate(format!("race {}", race.name)));
        }
        state.next_race += 1;
        let race = Race {
            race_id: RaceId::new(state.next_race),
            name: race.name,
            desc: race.desc,
            bonus: race.bonus,
            malus: race.malus,
        };
        state.races.insert(race.race_id, race.clone());
        Ok(race)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tama_auth::Role;

    use super::*;

    fn credential(user_name: &str, email: &str) -> NewCredential {
        NewCredential {
            user_name: user_name.to_string(),
            password_hash: PasswordDigest::from_phc("$argon2id$stub"),
            role: Role::General,
            name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            profil_picture: None,
            creation_date: Utc::now(),
        }
    }

    fn pet(name: &str) -> NewTama {
        NewTama {
            name: name.to_string(),
            race: "cat".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_rejects_duplicates() {
        let store = InMemoryStore::new();

        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();
        let bob = store.insert(credential("bob", "b@example.com")).await.unwrap();
        assert_eq!(alice.user_id, UserId::new(1));
        assert_eq!(bob.user_id, UserId::new(2));

        let by_name = store.insert(credential("alice", "other@example.com")).await;
        assert!(matches!(by_name, Err(StoreError::Duplicate(_))));

        let by_email = store.insert(credential("carol", "a@example.com")).await;
        assert!(matches!(by_email, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn concurrent_registrations_keep_one_winner() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(credential("alice", "a@example.com")).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn credential_lookup_exposes_the_stored_digest() {
        let store = InMemoryStore::new();
        store.insert(credential("alice", "a@example.com")).await.unwrap();

        let found = store.find_by_identifier("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash.as_phc(), "$argon2id$stub");
        assert!(store.find_by_identifier("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_user_applies_fields_and_checks_uniqueness() {
        let store = InMemoryStore::new();
        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();
        store.insert(credential("bob", "b@example.com")).await.unwrap();

        let updated = store
            .update_user(
                alice.user_id,
                UserUpdate {
                    name: Some("Alicia".to_string()),
                    gaming_time: Some(42),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.gaming_time, 42);
        assert_eq!(updated.user_name, "alice");

        let clash = store
            .update_user(
                alice.user_id,
                UserUpdate {
                    email: Some("b@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(StoreError::Duplicate(_))));

        // Re-submitting your own values is not a clash.
        let same = store
            .update_user(
                alice.user_id,
                UserUpdate {
                    user_name: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(same.unwrap().is_some());

        assert!(store
            .update_user(UserId::new(99), UserUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn password_rehash_replaces_the_digest() {
        let store = InMemoryStore::new();
        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();

        store
            .update_user(
                alice.user_id,
                UserUpdate {
                    password_hash: Some(PasswordDigest::from_phc("$argon2id$new")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = store.find_by_identifier("alice").await.unwrap().unwrap();
        assert_eq!(found.password_hash.as_phc(), "$argon2id$new");
    }

    #[tokio::test]
    async fn tamas_are_scoped_by_owner() {
        let store = InMemoryStore::new();
        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();
        let bob = store.insert(credential("bob", "b@example.com")).await.unwrap();

        let pixel = store.create_tama(alice.user_id, pet("Pixel")).await.unwrap();
        store.create_tama(bob.user_id, pet("Byte")).await.unwrap();

        assert_eq!(store.list_tamas(None).await.unwrap().len(), 2);
        let mine = store.list_tamas(Some(alice.user_id)).await.unwrap();
        assert_eq!(mine, vec![pixel.clone()]);

        assert_eq!(store.find_owner(pixel.tama_id).await.unwrap(), Some(alice.user_id));
        assert_eq!(store.find_owner(TamaId::new(99)).await.unwrap(), None);

        let orphan = store.create_tama(UserId::new(99), pet("Ghost")).await;
        assert_eq!(orphan, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn update_and_delete_tama() {
        let store = InMemoryStore::new();
        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();
        let pixel = store.create_tama(alice.user_id, pet("Pixel")).await.unwrap();

        let renamed = store
            .update_tama(
                pixel.tama_id,
                TamaUpdate {
                    name: Some("Byte".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Byte");
        assert_eq!(renamed.user_id, alice.user_id);

        assert!(store.delete_tama(pixel.tama_id).await.unwrap());
        assert!(!store.delete_tama(pixel.tama_id).await.unwrap());
        assert!(store.get_tama(pixel.tama_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_tamas() {
        let store = InMemoryStore::new();
        let alice = store.insert(credential("alice", "a@example.com")).await.unwrap();
        let bob = store.insert(credential("bob", "b@example.com")).await.unwrap();
        store.create_tama(alice.user_id, pet("Pixel")).await.unwrap();
        let byte = store.create_tama(bob.user_id, pet("Byte")).await.unwrap();

        assert!(store.delete_user(alice.user_id).await.unwrap());
        assert!(!store.delete_user(alice.user_id).await.unwrap());
        assert_eq!(store.list_tamas(None).await.unwrap(), vec![byte]);
    }

    #[tokio::test]
    async fn races_round_trip() {
        let store = InMemoryStore::new();
        let race = store
            .create_race(NewRace {
                name: "cat".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(race.race_id, RaceId::new(1));
        assert_eq!(store.list_races().await.unwrap(), vec![race]);

        let again = store
            .create_race(NewRace {
                name: "cat".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(again, Err(StoreError::Duplicate(_))));
    }
}
