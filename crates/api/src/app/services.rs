use std::sync::Arc;

use tama_auth::{
    AuthError, Authenticator, Hs256TokenCodec, PasswordHasher, SigningSecret, TokenCodec,
};
use tama_infra::{InMemoryStore, RaceRepository, TamaRepository, UserRepository};

use crate::config::AppConfig;

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub auth: Authenticator<Arc<dyn UserRepository>>,
    pub users: Arc<dyn UserRepository>,
    pub tamas: Arc<dyn TamaRepository>,
    pub races: Arc<dyn RaceRepository>,
}

impl AppServices {
    /// Wire every repository to one backing store.
    pub fn new<S>(
        store: Arc<S>,
        hasher: PasswordHasher,
        codec: Arc<dyn TokenCodec>,
    ) -> Result<Self, AuthError>
    where
        S: UserRepository + TamaRepository + RaceRepository + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let tamas: Arc<dyn TamaRepository> = store.clone();
        let races: Arc<dyn RaceRepository> = store;
        let auth = Authenticator::new(users.clone(), hasher, codec)?;
        Ok(Self {
            auth,
            users,
            tamas,
            races,
        })
    }

    pub fn codec(&self) -> Arc<dyn TokenCodec> {
        self.auth.codec().clone()
    }
}

/// Build the token codec and hasher from configuration.
pub fn build_security(
    config: &AppConfig,
    secret: &SigningSecret,
) -> Result<(PasswordHasher, Arc<dyn TokenCodec>), AuthError> {
    let hasher = PasswordHasher::new(config.hasher)?;
    let codec = Hs256TokenCodec::new(secret).with_ttl(config.token_ttl);
    Ok((hasher, Arc::new(codec)))
}

/// Choose the backing store: Postgres when built with the `postgres`
/// feature and `DATABASE_URL` is set, otherwise the in-memory store.
pub async fn build_services(config: &AppConfig, secret: &SigningSecret) -> anyhow::Result<AppServices> {
    let (hasher, codec) = build_security(config, secret)?;

    #[cfg(feature = "postgres")]
    if let Some(url) = &config.database_url {
        let store = Arc::new(tama_infra::PostgresStore::connect(url).await?);
        tracing::info!("using postgres store");
        return Ok(AppServices::new(store, hasher, codec)?);
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but postgres support is not compiled in");
    }
    tracing::info!("using in-memory store");
    Ok(AppServices::new(Arc::new(InMemoryStore::new()), hasher, codec)?)
}
