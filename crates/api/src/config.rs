//! Process configuration read from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use tama_auth::{HasherParams, MAX_TOKEN_TTL, SecretError, SigningSecret};
use tama_observability::LogFormat;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingSecret,

    #[error("signing secret: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(format!("unknown environment {other}")),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    /// Raw signing secret; `None` when unset or empty.
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
    pub bind_addr: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub hasher: HasherParams,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl", &self.token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("hasher", &self.hasher)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: AppEnv::default(),
            jwt_secret: None,
            token_ttl: tama_auth::DEFAULT_TOKEN_TTL,
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            hasher: HasherParams::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// Deployment location of the secrets file.
pub const SECRETS_ENV_FILE: &str = "/etc/secrets/.env";

/// Load `KEY=value` pairs into the process environment.
///
/// Tries `path` first, then a `.env` in the working directory or its parents.
/// Variables already set in the environment win over file entries.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<PathBuf, dotenvy::Error> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(_) => dotenvy::dotenv(),
    }
}

fn parse<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let parsed = raw.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value: raw,
    })
}

impl AppConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset or empty keys fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("APP_ENV") {
            config.env = parse("APP_ENV", raw)?;
        }
        config.jwt_secret = get("JWT_SECRET");
        if let Some(raw) = get("TOKEN_TTL_SECS") {
            let secs: u64 = parse("TOKEN_TTL_SECS", raw.clone())?;
            if secs == 0 || secs > MAX_TOKEN_TTL.as_secs() {
                return Err(ConfigError::Invalid {
                    key: "TOKEN_TTL_SECS",
                    value: raw,
                    reason: format!("must be between 1 and {}", MAX_TOKEN_TTL.as_secs()),
                });
            }
            config.token_ttl = Duration::from_secs(secs);
        }
        if let Some(raw) = get("BIND_ADDR") {
            config.bind_addr = raw.trim().to_string();
        }
        if let Some(raw) = get("PORT") {
            config.port = parse("PORT", raw)?;
        }
        config.database_url = get("DATABASE_URL");
        if let Some(raw) = get("ARGON2_M_COST") {
            config.hasher.memory_kib = parse("ARGON2_M_COST", raw)?;
        }
        if let Some(raw) = get("ARGON2_T_COST") {
            config.hasher.iterations = parse("ARGON2_T_COST", raw)?;
        }
        if let Some(raw) = get("ARGON2_P_COST") {
            config.hasher.parallelism = parse("ARGON2_P_COST", raw)?;
        }
        if let Some(raw) = get("LOG_FORMAT") {
            config.log_format = parse("LOG_FORMAT", raw)?;
        }

        Ok(config)
    }

    /// Resolve the token signing secret.
    ///
    /// Production refuses to start without a configured secret; development
    /// falls back to a random per-process secret.
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        match (&self.jwt_secret, self.env) {
            (Some(secret), _) => Ok(SigningSecret::configured(secret.as_bytes())?),
            (None, AppEnv::Production) => Err(ConfigError::MissingSecret),
            (None, AppEnv::Development) => Ok(SigningSecret::ephemeral()?),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.env, AppEnv::Development);
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn reads_every_key() {
        let config = config(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "60"),
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "3000"),
            ("DATABASE_URL", "postgres://localhost/tama"),
            ("ARGON2_M_COST", "4096"),
            ("ARGON2_T_COST", "3"),
            ("ARGON2_P_COST", "2"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(config.env, AppEnv::Production);
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.listen_addr(), "127.0.0.1:3000");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/tama"));
        assert_eq!(config.hasher.memory_kib, 4096);
        assert_eq!(config.hasher.iterations, 3);
        assert_eq!(config.hasher.parallelism, 2);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = config(&[("TOKEN_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. }));

        let err = config(&[("TOKEN_TTL_SECS", "10000000000000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. }));

        let longest = MAX_TOKEN_TTL.as_secs().to_string();
        let config_at_limit = config(&[("TOKEN_TTL_SECS", longest.as_str())]).unwrap();
        assert_eq!(config_at_limit.token_ttl, MAX_TOKEN_TTL);

        assert!(config(&[("APP_ENV", "staging")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn production_requires_a_secret() {
        let prod = config(&[("APP_ENV", "production")]).unwrap();
        assert_eq!(prod.signing_secret().unwrap_err(), ConfigError::MissingSecret);

        // An empty value counts as unset.
        let blank = config(&[("APP_ENV", "production"), ("JWT_SECRET", " ")]).unwrap();
        assert_eq!(blank.signing_secret().unwrap_err(), ConfigError::MissingSecret);

        let dev = config(&[]).unwrap();
        assert!(dev.signing_secret().unwrap().is_ephemeral());

        let configured = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert!(!configured.signing_secret().unwrap().is_ephemeral());
    }

    #[test]
    fn env_file_entries_reach_the_environment() {
        let path = std::env::temp_dir().join(format!("tama-api-{}.env", std::process::id()));
        std::fs::write(&path, "TAMA_TEST_ENV_FILE_KEY=from-file\n").unwrap();

        let loaded = load_env_file(&path).unwrap();
        assert_eq!(loaded, path);
        assert_eq!(std::env::var("TAMA_TEST_ENV_FILE_KEY").as_deref(), Ok("from-file"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
