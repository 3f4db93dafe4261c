use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Privilege level attached to an identity.
///
/// Roles are a closed set. They are *not* compared numerically: rules match
/// on the exact variant, and [`Role::SuperAdmin`] is the only override that
/// satisfies any single required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Default role assigned at registration.
    #[default]
    General,
    Admin,
    /// Top privilege level. The only role allowed to change another identity's role.
    SuperAdmin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::General => "general",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Universal override predicate.
    pub fn is_top(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Roles that may read/update resources they do not own.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Role::General),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
