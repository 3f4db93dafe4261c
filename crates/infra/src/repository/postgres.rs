//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Backend` |
//! | Other | N/A | `Backend` |
//!
//! Uniqueness of `user_name` and `email` is enforced by the schema, so two
//! concurrent registrations for the same identifier cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use tama_auth::{
    Credential, CredentialStore, NewCredential, OwnershipLookup, PasswordDigest, Role, StoreError,
    UserProfile,
};
use tama_core::{RaceId, TamaId, UserId};

use super::{RaceRepository, TamaRepository, UserRepository};
use crate::models::{NewRace, NewTama, Race, Tama, TamaUpdate, UserUpdate};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        user_name TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        profil_picture TEXT,
        gaming_time BIGINT NOT NULL DEFAULT 0,
        creation_date TIMESTAMPTZ NOT NULL,
        last_connection_date TIMESTAMPTZ,
        role TEXT NOT NULL DEFAULT 'general'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS races (
        race_id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        "desc" TEXT,
        bonus TEXT,
        malus TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tamas (
        tama_id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
        tama_stats_id BIGINT,
        name TEXT NOT NULL,
        sexe BOOLEAN NOT NULL DEFAULT FALSE,
        race TEXT NOT NULL,
        sickness TEXT,
        birthday TIMESTAMPTZ,
        death_day TIMESTAMPTZ,
        traits TEXT,
        life_choices TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tamas_user_id_idx ON tamas (user_id)",
];

const USER_COLUMNS: &str = "user_id, name, last_name, user_name, email, profil_picture, \
     gaming_time, creation_date, last_connection_date, role";

const TAMA_COLUMNS: &str = "tama_id, user_id, tama_stats_id, name, sexe, race, sickness, \
     birthday, death_day, traits, life_choices";

/// Postgres store implementing every repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables and indexes if they are missing. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tracing::info!("database schema ready");
        Ok(())
    }
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = role.parse::<Role>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(UserProfile {
        user_id: UserId::new(row.try_get("user_id")?),
        name: row.try_get("name")?,
        last_name: row.try_get("last_name")?,
        user_name: row.try_get("user_name")?,
        email: row.try_get("email")?,
        profil_picture: row.try_get("profil_picture")?,
        gaming_time: row.try_get("gaming_time")?,
        creation_date: row.try_get("creation_date")?,
        last_connection_date: row.try_get("last_connection_date")?,
        role,
    })
}

fn tama_from_row(row: &PgRow) -> Result<Tama, sqlx::Error> {
    Ok(Tama {
        tama_id: TamaId::new(row.try_get("tama_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        tama_stats_id: row.try_get("tama_stats_id")?,
        name: row.try_get("name")?,
        sexe: row.try_get("sexe")?,
        race: row.try_get("race")?,
        sickness: row.try_get("sickness")?,
        birthday: row.try_get("birthday")?,
        death_day: row.try_get("death_day")?,
        traits: row.try_get("traits")?,
        life_choices: row.try_get("life_choices")?,
    })
}

fn race_from_row(row: &PgRow) -> Result<Race, sqlx::Error> {
    Ok(Race {
        race_id: RaceId::new(row.try_get("race_id")?),
        name: row.try_get("name")?,
        desc: row.try_get("desc")?,
        bonus: row.try_get("bonus")?,
        malus: row.try_get("malus")?,
    })
}

#[async_trait::async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_by_identifier(&self, user_name: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query(
            "SELECT user_id, user_name, password_hash, role FROM users WHERE user_name = $1",
        )
        .bind(user_name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_identifier", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |row: &PgRow| -> Result<Credential, sqlx::Error> {
            let role: String = row.try_get("role")?;
            Ok(Credential {
                id: UserId::new(row.try_get("user_id")?),
                user_name: row.try_get("user_name")?,
                password_hash: PasswordDigest::from_phc(row.try_get::<String, _>("password_hash")?),
                role: role.parse::<Role>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            })
        };
        decode(&row)
            .map(Some)
            .map_err(|e| map_sqlx_error("find_by_identifier", e))
    }

    #[instrument(skip(self, credential), fields(user_name = %credential.user_name), err)]
    async fn insert(&self, credential: NewCredential) -> Result<UserProfile, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, last_name, user_name, email, password_hash, profil_picture, \
             creation_date, role) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&credential.name)
            .bind(&credential.last_name)
            .bind(&credential.user_name)
            .bind(&credential.email)
            .bind(credential.password_hash.as_phc())
            .bind(&credential.profil_picture)
            .bind(credential.creation_date)
            .bind(credential.role.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;

        profile_from_row(&row).map_err(|e| map_sqlx_error("insert_user", e))
    }

    #[instrument(skip(self), err)]
    async fn update_last_seen(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_connection_date = $1 WHERE user_id = $2")
            .bind(at)
            .bind(user_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_last_seen", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresStore {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter()
            .map(profile_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_users", e))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.as_ref()
            .map(profile_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_user", e))
    }

    #[instrument(skip(self, update), err)]
    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                last_name = COALESCE($3, last_name), \
                user_name = COALESCE($4, user_name), \
                email = COALESCE($5, email), \
                profil_picture = COALESCE($6, profil_picture), \
                gaming_time = COALESCE($7, gaming_time), \
                role = COALESCE($8, role), \
                password_hash = COALESCE($9, password_hash) \
             WHERE user_id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(update.name)
            .bind(update.last_name)
            .bind(update.user_name)
            .bind(update.email)
            .bind(update.profil_picture)
            .bind(update.gaming_time)
            .bind(update.role.map(|role| role.as_str()))
            .bind(update.password_hash.as_ref().map(PasswordDigest::as_phc))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;

        row.as_ref()
            .map(profile_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("update_user", e))
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        // Owned tamas go with the user through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl OwnershipLookup<TamaId> for PostgresStore {
    async fn find_owner(&self, id: TamaId) -> Result<Option<UserId>, StoreError> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM tamas WHERE tama_id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_owner", e))?;
        Ok(owner.map(UserId::new))
    }
}

#[async_trait::async_trait]
impl TamaRepository for PostgresStore {
    async fn list_tamas(&self, owner: Option<UserId>) -> Result<Vec<Tama>, StoreError> {
        let sql = format!(
            "SELECT {TAMA_COLUMNS} FROM tamas WHERE ($1::BIGINT IS NULL OR user_id = $1) \
             ORDER BY tama_id"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.map(|id| id.get()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tamas", e))?;

        rows.iter()
            .map(tama_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_tamas", e))
    }

    async fn get_tama(&self, id: TamaId) -> Result<Option<Tama>, StoreError> {
        let sql = format!("SELECT {TAMA_COLUMNS} FROM tamas WHERE tama_id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_tama", e))?;

        row.as_ref()
            .map(tama_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_tama", e))
    }

    #[instrument(skip(self, tama), err)]
    async fn create_tama(&self, owner: UserId, tama: NewTama) -> Result<Tama, StoreError> {
        let sql = format!(
            "INSERT INTO tamas (user_id, tama_stats_id, name, sexe, race, sickness, birthday, \
             death_day, traits, life_choices) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TAMA_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(owner.get())
            .bind(tama.tama_stats_id)
            .bind(tama.name.trim())
            .bind(tama.sexe)
            .bind(tama.race.trim())
            .bind(&tama.sickness)
            .bind(tama.birthday)
            .bind(tama.death_day)
            .bind(&tama.traits)
            .bind(&tama.life_choices)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_tama", e))?;

        tama_from_row(&row).map_err(|e| map_sqlx_error("create_tama", e))
    }

    #[instrument(skip(self, update), err)]
    async fn update_tama(&self, id: TamaId, update: TamaUpdate) -> Result<Option<Tama>, StoreError> {
        let sql = format!(
            "UPDATE tamas SET \
                name = COALESCE($2, name), \
                sexe = COALESCE($3, sexe), \
                race = COALESCE($4, race), \
                tama_stats_id = COALESCE($5, tama_stats_id), \
                sickness = COALESCE($6, sickness), \
                birthday = COALESCE($7, birthday), \
                death_day = COALESCE($8, death_day), \
                traits = COALESCE($9, traits), \
                life_choices = COALESCE($10, life_choices) \
             WHERE tama_id = $1 RETURNING {TAMA_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(update.name)
            .bind(update.sexe)
            .bind(update.race)
            .bind(update.tama_stats_id)
            .bind(update.sickness)
            .bind(update.birthday)
            .bind(update.death_day)
            .bind(update.traits)
            .bind(update.life_choices)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_tama", e))?;

        row.as_ref()
            .map(tama_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("update_tama", e))
    }

    #[instrument(skip(self), err)]
    async fn delete_tama(&self, id: TamaId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tamas WHERE tama_id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_tama", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RaceRepository for PostgresStore {
    async fn list_races(&self) -> Result<Vec<Race>, StoreError> {
        let rows = sqlx::query(r#"SELECT race_id, name, "desc", bonus, malus FROM races ORDER BY race_id"#)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_races", e))?;

        rows.iter()
            .map(race_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_races", e))
    }

    async fn create_race(&self, race: NewRace) -> Result<Race, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO races (name, "desc", bonus, malus) VALUES ($1, $2, $3, $4)
               RETURNING race_id, name, "desc", bonus, malus"#,
        )
        .bind(&race.name)
        .bind(&race.desc)
        .bind(&race.bonus)
        .bind(&race.malus)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_race", e))?;

        race_from_row(&row).map_err(|e| map_sqlx_error("create_race", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation
                Some("23505") => StoreError::Duplicate(
                    db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or(msg),
                ),
                // Foreign key violation: the referenced user is gone.
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
