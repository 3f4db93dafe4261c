//! `tama-auth`: authentication/authorization boundary.
//!
//! This crate knows nothing about HTTP or storage: it consumes
//! the [`CredentialStore`] / [`OwnershipLookup`] collaborator traits and
//! exposes [`Authenticator::login`] and [`authorize_request`].

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod credential;
pub mod error;
pub mod password;
pub mod principal;
pub mod roles;
pub mod secret;
pub mod store;
pub mod token;

pub use authenticate::Authenticator;
pub use authorize::{
    AccessRule, BEARER_PREFIX, authenticate_request, authorize, authorize_request, extract_token,
    retain_role,
};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use credential::{Credential, NewCredential, NewUser, PasswordDigest, UserProfile};
pub use error::AuthError;
pub use password::{HashError, HasherParams, PasswordHasher};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use secret::{SecretError, SecretSource, SigningSecret};
pub use store::{CredentialStore, OwnershipLookup, StoreError};
pub use token::{DEFAULT_TOKEN_TTL, Hs256TokenCodec, MAX_TOKEN_TTL, TokenCodec, TokenError};
