use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    response::IntoResponse,
    routing::get,
};

use tama_auth::{AccessRule, Principal, Role, authorize, retain_role};
use tama_core::UserId;
use tama_infra::{UserRepository, UserUpdate};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    if let Err(e) = authorize(&principal, &AccessRule::RequireRole(Role::Admin)) {
        return errors::auth_error_to_response(e);
    }

    match services.users.list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    if let Err(e) = authorize(&principal, &AccessRule::OwnerOrElevated { owner_id: id }) {
        return errors::auth_error_to_response(e);
    }

    match services.users.get_user(id).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    if let Err(e) = authorize(&principal, &AccessRule::OwnerOrElevated { owner_id: id }) {
        return errors::auth_error_to_response(e);
    }
    let body = match dto::body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    let current = match services.users.get_user(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let role = retain_role(&principal, current.role, body.role);
    if body.role.is_some_and(|requested| requested != role) {
        tracing::debug!(
            user_id = %principal.user_id,
            target = %id,
            "role change ignored for non-top caller"
        );
    }

    let password_hash = match body.password.as_deref().map(|p| services.auth.hash_password(p)) {
        None => None,
        Some(Ok(digest)) => Some(digest),
        Some(Err(e)) => return errors::auth_error_to_response(e),
    };

    let update = UserUpdate {
        name: body.name,
        last_name: body.last_name,
        user_name: body.user_name,
        email: body.email,
        profil_picture: body.profil_picture,
        gaming_time: body.gaming_time,
        role: (role != current.role).then_some(role),
        password_hash,
    };
    if let Err(e) = update.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.users.update_user(id, update).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = %principal.user_id, target = %id, "user updated");
            Json(user).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authorize(&principal, &AccessRule::RequireRole(Role::SuperAdmin)) {
        return errors::auth_error_to_response(e);
    }
    let id: UserId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.users.delete_user(id).await {
        Ok(true) => {
            tracing::info!(user_id = %principal.user_id, target = %id, "user deleted");
            Json(serde_json::json!({ "message": "User deleted" })).into_response()
        }
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
