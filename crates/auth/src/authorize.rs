//! Per-request authorization: extract, validate, then evaluate a rule.
//!
//! - No IO
//! - No panics
//! - Nothing cached between requests

use chrono::{DateTime, Utc};

use tama_core::{Owned, UserId};

use crate::{AuthError, Principal, Role, TokenCodec};

/// Scheme prefix accepted on the `Authorization` header (single space).
pub const BEARER_PREFIX: &str = "Bearer ";

/// The rule guarding an operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Any authenticated identity.
    Authenticated,

    /// Exact role, or the top role as universal override.
    RequireRole(Role),

    /// Read/update of a specific resource: elevated roles, or the owner.
    OwnerOrElevated { owner_id: UserId },

    /// Delete of a specific resource: super admin, or an admin who owns it.
    /// Plain ownership is not enough.
    DestructiveOwner { owner_id: UserId },
}

impl AccessRule {
    pub fn owner_or_elevated(resource: &impl Owned) -> Self {
        AccessRule::OwnerOrElevated {
            owner_id: resource.owner_id(),
        }
    }

    pub fn destructive_owner(resource: &impl Owned) -> Self {
        AccessRule::DestructiveOwner {
            owner_id: resource.owner_id(),
        }
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// `Bearer <token>` is stripped once; any other form is taken literally.
pub fn extract_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Extract and validate a token, binding the identity it carries.
pub fn authenticate_request(
    codec: &dyn TokenCodec,
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Principal, AuthError> {
    let token = extract_token(header)?;
    let claims = codec
        .validate(token, now)
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(Principal::from(&claims))
}

/// Evaluate `rule` for an already authenticated principal.
pub fn authorize(principal: &Principal, rule: &AccessRule) -> Result<(), AuthError> {
    let allowed = match *rule {
        AccessRule::Authenticated => true,
        AccessRule::RequireRole(required) => principal.role == required || principal.role.is_top(),
        AccessRule::OwnerOrElevated { owner_id } => match principal.role {
            Role::Admin | Role::SuperAdmin => true,
            Role::General => principal.user_id == owner_id,
        },
        AccessRule::DestructiveOwner { owner_id } => match principal.role {
            Role::SuperAdmin => true,
            Role::Admin => principal.user_id == owner_id,
            Role::General => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %principal.user_id,
            role = %principal.role,
            rule = ?rule,
            "authorization denied"
        );
        Err(AuthError::Forbidden)
    }
}

/// Full request pipeline: extract, validate, authorize.
pub fn authorize_request(
    codec: &dyn TokenCodec,
    header: Option<&str>,
    rule: &AccessRule,
    now: DateTime<Utc>,
) -> Result<Principal, AuthError> {
    let principal = authenticate_request(codec, header, now)?;
    authorize(&principal, rule)?;
    Ok(principal)
}

/// Field-level restriction on role changes.
///
/// Only the top role may change a role; for anyone else the requested value is
/// silently dropped so the rest of the update still goes through.
pub fn retain_role(principal: &Principal, current: Role, requested: Option<Role>) -> Role {
    match requested {
        Some(role) if principal.role.is_top() => role,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hs256TokenCodec, SigningSecret};
    use proptest::prelude::*;

    fn codec() -> Hs256TokenCodec {
        Hs256TokenCodec::new(&SigningSecret::configured("test-secret").unwrap())
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn p(id: i64, role: Role) -> Principal {
        Principal::new(UserId::new(id), role)
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::General), Just(Role::Admin), Just(Role::SuperAdmin)]
    }

    #[test]
    fn extracts_bare_and_bearer_tokens() {
        assert_eq!(extract_token(Some("abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        // Other prefix forms are taken literally.
        assert_eq!(extract_token(Some("bearer abc")), Ok("bearer abc"));
        assert_eq!(extract_token(Some("Bearer  abc")), Ok(" abc"));
        assert_eq!(extract_token(Some("Token abc")), Ok("Token abc"));
    }

    #[test]
    fn absent_or_empty_header_is_missing_token() {
        assert_eq!(extract_token(None), Err(AuthError::MissingToken));
        assert_eq!(extract_token(Some("")), Err(AuthError::MissingToken));
        assert_eq!(extract_token(Some("Bearer ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn pipeline_binds_identity_from_token() {
        let codec = codec();
        let token = codec.issue(UserId::new(5), Role::Admin, t0()).unwrap();
        let header = format!("Bearer {token}");

        let principal = authenticate_request(&codec, Some(&header), t0()).unwrap();
        assert_eq!(principal, p(5, Role::Admin));

        // The bare form works too.
        assert_eq!(authenticate_request(&codec, Some(&token), t0()).unwrap(), principal);
    }

    #[test]
    fn pipeline_stage_errors() {
        let codec = codec();
        let rule = AccessRule::Authenticated;

        assert_eq!(
            authorize_request(&codec, None, &rule, t0()),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authorize_request(&codec, Some("Bearer garbage"), &rule, t0()),
            Err(AuthError::InvalidToken)
        );

        let token = codec.issue(UserId::new(1), Role::General, t0()).unwrap();
        assert_eq!(
            authorize_request(&codec, Some(&token), &AccessRule::RequireRole(Role::Admin), t0()),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn role_gated_list_users() {
        let rule = AccessRule::RequireRole(Role::Admin);

        assert_eq!(authorize(&p(1, Role::General), &rule), Err(AuthError::Forbidden));
        assert_eq!(authorize(&p(1, Role::Admin), &rule), Ok(()));
        assert_eq!(authorize(&p(1, Role::SuperAdmin), &rule), Ok(()));
    }

    #[test]
    fn super_admin_requirement_is_not_met_by_admin() {
        let rule = AccessRule::RequireRole(Role::SuperAdmin);
        assert_eq!(authorize(&p(1, Role::Admin), &rule), Err(AuthError::Forbidden));
        assert_eq!(authorize(&p(1, Role::SuperAdmin), &rule), Ok(()));
    }

    #[test]
    fn ownership_gated_view_and_update() {
        let rule = AccessRule::OwnerOrElevated {
            owner_id: UserId::new(5),
        };

        assert_eq!(authorize(&p(5, Role::General), &rule), Ok(()));
        assert_eq!(authorize(&p(7, Role::General), &rule), Err(AuthError::Forbidden));
        assert_eq!(authorize(&p(7, Role::Admin), &rule), Ok(()));
        assert_eq!(authorize(&p(7, Role::SuperAdmin), &rule), Ok(()));
    }

    #[test]
    fn destructive_rule_is_stricter_than_ownership() {
        let owned_by_7 = AccessRule::DestructiveOwner {
            owner_id: UserId::new(7),
        };
        let owned_by_5 = AccessRule::DestructiveOwner {
            owner_id: UserId::new(5),
        };

        // Admin 5 cannot delete identity 7's resource.
        assert_eq!(authorize(&p(5, Role::Admin), &owned_by_7), Err(AuthError::Forbidden));
        // Super admin can delete anything.
        assert_eq!(authorize(&p(5, Role::SuperAdmin), &owned_by_7), Ok(()));
        // Admin owner can delete their own.
        assert_eq!(authorize(&p(5, Role::Admin), &owned_by_5), Ok(()));
        // Plain ownership is insufficient.
        assert_eq!(authorize(&p(5, Role::General), &owned_by_5), Err(AuthError::Forbidden));
    }

    #[test]
    fn role_changes_need_the_top_role() {
        let owner = p(5, Role::General);
        assert_eq!(retain_role(&owner, Role::General, Some(Role::SuperAdmin)), Role::General);

        let admin = p(1, Role::Admin);
        assert_eq!(retain_role(&admin, Role::General, Some(Role::Admin)), Role::General);

        let root = p(1, Role::SuperAdmin);
        assert_eq!(retain_role(&root, Role::General, Some(Role::Admin)), Role::Admin);
        assert_eq!(retain_role(&root, Role::Admin, None), Role::Admin);
    }

    proptest! {
        /// Property: super admin passes every rule.
        #[test]
        fn super_admin_is_never_forbidden(
            caller in 1i64..20,
            owner in 1i64..20,
            required in role_strategy(),
        ) {
            let root = p(caller, Role::SuperAdmin);
            let owner_id = UserId::new(owner);
            for rule in [
                AccessRule::Authenticated,
                AccessRule::RequireRole(required),
                AccessRule::OwnerOrElevated { owner_id },
                AccessRule::DestructiveOwner { owner_id },
            ] {
                prop_assert_eq!(authorize(&root, &rule), Ok(()));
            }
        }

        /// Property: anything allowed to delete is also allowed to view/update.
        #[test]
        fn delete_permission_implies_update_permission(
            caller in 1i64..20,
            owner in 1i64..20,
            role in role_strategy(),
        ) {
            let principal = p(caller, role);
            let owner_id = UserId::new(owner);
            if authorize(&principal, &AccessRule::DestructiveOwner { owner_id }).is_ok() {
                let may_update = authorize(&principal, &AccessRule::OwnerOrElevated { owner_id });
                prop_assert!(may_update.is_ok());
            }
        }

        /// Property: non-top callers never change a role.
        #[test]
        fn role_is_retained_for_non_top_callers(
            caller_role in prop_oneof![Just(Role::General), Just(Role::Admin)],
            current in role_strategy(),
            requested in proptest::option::of(role_strategy()),
        ) {
            prop_assert_eq!(retain_role(&p(1, caller_role), current, requested), current);
        }
    }
}
