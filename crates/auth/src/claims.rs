use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tama_core::UserId;

use crate::Role;

/// Identity claim carried inside a session token.
///
/// Self-contained: no server-side session backs it. The role is a snapshot
/// taken at login; a later promotion or demotion only shows up after the
/// next login (known staleness window of stateless tokens).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Role at the time the token was issued.
    pub role: Role,

    /// Issued-at (Unix seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration (Unix seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

impl Claims {
    /// Build claims valid for `[now, now + ttl)`, truncated to whole seconds.
    ///
    /// Returns `None` when the expiry falls outside the representable range.
    pub fn new(sub: UserId, role: Role, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let iat = now.trunc_subsecs(0);
        let exp = iat.checked_add_signed(ttl)?;
        Some(Self { sub, role, iat, exp })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate claim timestamps against `now`.
///
/// Signature verification happens in [`crate::token`]; this only checks time.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn valid_inside_window_only() {
        let claims = Claims::new(UserId::new(1), Role::General, t0(), Duration::hours(24)).unwrap();

        assert_eq!(validate_claims(&claims, t0()), Ok(()));
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(24) - Duration::seconds(1)),
            Ok(())
        );
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(24)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, t0() - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut claims = Claims::new(UserId::new(1), Role::Admin, t0(), Duration::hours(1)).unwrap();
        claims.exp = claims.iat;
        assert_eq!(
            validate_claims(&claims, t0()),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn sub_second_issuance_is_truncated() {
        let now = t0() + Duration::milliseconds(750);
        let claims = Claims::new(UserId::new(1), Role::General, now, Duration::seconds(10)).unwrap();

        assert_eq!(claims.iat, t0());
        assert_eq!(validate_claims(&claims, now), Ok(()));
    }

    #[test]
    fn timestamps_serialize_as_unix_seconds() {
        let claims = Claims::new(UserId::new(5), Role::SuperAdmin, t0(), Duration::seconds(60)).unwrap();
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], 5);
        assert_eq!(json["role"], "super_admin");
        assert_eq!(json["iat"], 1_700_000_000i64);
        assert_eq!(json["exp"], 1_700_000_060i64);
    }

    #[test]
    fn expiry_past_the_calendar_range_is_refused() {
        let late = DateTime::<Utc>::MAX_UTC;
        assert!(Claims::new(UserId::new(1), Role::General, late, Duration::seconds(1)).is_none());
        assert!(Claims::new(UserId::new(1), Role::General, t0(), Duration::MAX).is_none());
    }
}
