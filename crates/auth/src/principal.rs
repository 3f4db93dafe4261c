use serde::Serialize;

use tama_core::UserId;

use crate::{Claims, Role};

/// Identity bound to a request once its token has been validated.
///
/// The role is the snapshot carried by the token, not a live read of storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }
}
