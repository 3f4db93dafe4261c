//! Signed, time-bounded session tokens (compact HS256 JWTs).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use tama_core::UserId;

use crate::{Claims, Role, SigningSecret, validate_claims};

/// Default validity window of an issued token.
pub const DEFAULT_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// Longest validity window a codec will issue (ten years).
pub const MAX_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Uniform rejection: forged, malformed and expired tokens look the same.
    #[error("invalid token")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and validates session tokens.
///
/// Implementations are pure over their inputs and safe to share across tasks.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, sub: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError>;

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// HMAC-SHA256 token codec keyed by a [`SigningSecret`].
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL.as_secs() as i64),
        }
    }

    /// Override the validity window, clamped to `1s..=MAX_TOKEN_TTL`.
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        let secs = ttl.as_secs().clamp(1, MAX_TOKEN_TTL.as_secs()) as i64;
        if let Some(ttl) = Duration::try_seconds(secs) {
            self.ttl = ttl;
        }
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn validation() -> Validation {
        // Time checks run against the caller-supplied `now` in `validate_claims`,
        // not against the system clock inside jsonwebtoken.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, sub: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(sub, role, now, self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Self::validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                TokenError::Invalid
            })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, sub = %data.claims.sub, "token rejected");
            TokenError::Invalid
        })?;

        Ok(data.claims)
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
