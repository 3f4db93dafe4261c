//! Resource models served behind the auth boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tama_auth::{PasswordDigest, Role};
use tama_core::{DomainResult, Entity, Owned, RaceId, TamaId, UserId, require_non_blank};

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Partial update of a user profile. `None` leaves the field untouched.
///
/// `role` must already have passed [`tama_auth::retain_role`], and
/// `password_hash` can only come from re-hashing a new plaintext.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub profil_picture: Option<String>,
    pub gaming_time: Option<i64>,
    pub role: Option<Role>,
    pub password_hash: Option<PasswordDigest>,
}

impl UserUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("last_name", &self.last_name),
            ("user_name", &self.user_name),
            ("email", &self.email),
        ] {
            if let Some(value) = value {
                require_non_blank(field, value)?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tamas
// ─────────────────────────────────────────────────────────────────────────────

/// A virtual pet owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tama {
    pub tama_id: TamaId,
    /// Owner; assigned at creation from the authenticated creator.
    pub user_id: UserId,
    pub tama_stats_id: Option<i64>,
    pub name: String,
    pub sexe: bool,
    pub race: String,
    pub sickness: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub death_day: Option<DateTime<Utc>>,
    pub traits: Option<String>,
    pub life_choices: Option<String>,
}

impl Entity for Tama {
    type Id = TamaId;

    fn id(&self) -> &Self::Id {
        &self.tama_id
    }
}

impl Owned for Tama {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

/// Creation request. There is no owner field: the owner is the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTama {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sexe: bool,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub tama_stats_id: Option<i64>,
    #[serde(default)]
    pub sickness: Option<String>,
    #[serde(default)]
    pub birthday: Option<DateTime<Utc>>,
    #[serde(default)]
    pub death_day: Option<DateTime<Utc>>,
    #[serde(default)]
    pub traits: Option<String>,
    #[serde(default)]
    pub life_choices: Option<String>,
}

impl NewTama {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("race", &self.race)?;
        Ok(())
    }

    pub fn into_tama(self, tama_id: TamaId, owner: UserId) -> Tama {
        Tama {
            tama_id,
            user_id: owner,
            tama_stats_id: self.tama_stats_id,
            name: self.name.trim().to_string(),
            sexe: self.sexe,
            race: self.race.trim().to_string(),
            sickness: self.sickness,
            birthday: self.birthday,
            death_day: self.death_day,
            traits: self.traits,
            life_choices: self.life_choices,
        }
    }
}

/// Partial update of a tama.
///
/// Neither the id nor the owner can be changed through this path; unknown
/// body fields such as `user_id` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TamaUpdate {
    pub name: Option<String>,
    pub sexe: Option<bool>,
    pub race: Option<String>,
    pub tama_stats_id: Option<i64>,
    pub sickness: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub death_day: Option<DateTime<Utc>>,
    pub traits: Option<String>,
    pub life_choices: Option<String>,
}

impl TamaUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(race) = &self.race {
            require_non_blank("race", race)?;
        }
        Ok(())
    }

    pub fn apply(self, tama: &mut Tama) {
        if let Some(v) = self.name {
            tama.name = v;
        }
        if let Some(v) = self.sexe {
            tama.sexe = v;
        }
        if let Some(v) = self.race {
            tama.race = v;
        }
        if let Some(v) = self.tama_stats_id {
            tama.tama_stats_id = Some(v);
        }
        if let Some(v) = self.sickness {
            tama.sickness = Some(v);
        }
        if let Some(v) = self.birthday {
            tama.birthday = Some(v);
        }
        if let Some(v) = self.death_day {
            tama.death_day = Some(v);
        }
        if let Some(v) = self.traits {
            tama.traits = Some(v);
        }
        if let Some(v) = self.life_choices {
            tama.life_choices = Some(v);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Races (public reference data)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub race_id: RaceId,
    pub name: String,
    pub desc: Option<String>,
    pub bonus: Option<String>,
    pub malus: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRace {
    pub name: String,
    pub desc: Option<String>,
    pub bonus: Option<String>,
    pub malus: Option<String>,
}
