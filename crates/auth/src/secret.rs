//! Process-wide token signing secret.

use thiserror::Error;

const EPHEMERAL_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("signing secret must not be empty")]
    Empty,

    #[error("could not generate an ephemeral signing secret: {0}")]
    Rng(String),
}

/// Where the signing secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// Supplied by the operator (e.g. `JWT_SECRET`).
    Configured,
    /// Randomly generated at startup; tokens do not survive a restart.
    Ephemeral,
}

/// Symmetric HMAC key, built once at startup and never mutated.
#[derive(Clone)]
pub struct SigningSecret {
    bytes: Vec<u8>,
    source: SecretSource,
}

impl SigningSecret {
    pub fn configured(bytes: impl Into<Vec<u8>>) -> Result<Self, SecretError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(Self {
            bytes,
            source: SecretSource::Configured,
        })
    }

    /// Random per-process secret for local/test use when none is configured.
    pub fn ephemeral() -> Result<Self, SecretError> {
        let mut bytes = vec![0u8; EPHEMERAL_SECRET_LEN];
        getrandom::getrandom(&mut bytes).map_err(|e| SecretError::Rng(e.to_string()))?;
        Ok(Self {
            bytes,
            source: SecretSource::Ephemeral,
        })
    }

    pub fn source(&self) -> SecretSource {
        self.source
    }

    pub fn is_ephemeral(&self) -> bool {
        self.source == SecretSource::Ephemeral
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("source", &self.source)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(
            SigningSecret::configured(Vec::new()).unwrap_err(),
            SecretError::Empty
        );
    }

    #[test]
    fn ephemeral_secrets_are_random() {
        let a = SigningSecret::ephemeral().unwrap();
        let b = SigningSecret::ephemeral().unwrap();

        assert!(a.is_ephemeral());
        assert_eq!(a.as_bytes().len(), EPHEMERAL_SECRET_LEN);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn debug_redacts_key_material() {
        let secret = SigningSecret::configured("hunter2").unwrap();
        assert_eq!(secret.source(), SecretSource::Configured);
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
