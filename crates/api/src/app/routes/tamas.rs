use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use tama_auth::{AccessRule, OwnershipLookup, Principal, authorize};
use tama_core::TamaId;
use tama_infra::{NewTama, TamaRepository, TamaUpdate};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tamas).post(create_tama))
        .route("/:id", get(get_tama).put(update_tama).delete(delete_tama))
}

/// Elevated callers see every tama; everyone else only their own.
pub async fn list_tamas(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    let owner = (!principal.role.is_elevated()).then_some(principal.user_id);
    match services.tamas.list_tamas(owner).await {
        Ok(tamas) => Json(tamas).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_tama(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<NewTama>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };
    if let Err(e) = body.validate() {
        return errors::domain_error_to_response(e);
    }

    // The owner is always the caller, whatever the body says.
    match services.tamas.create_tama(principal.user_id, body).await {
        Ok(tama) => {
            tracing::info!(user_id = %principal.user_id, tama_id = %tama.tama_id, "tama created");
            (StatusCode::CREATED, Json(tama)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_tama(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TamaId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let tama = match services.tamas.get_tama(id).await {
        Ok(Some(tama)) => tama,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };
    if let Err(e) = authorize(&principal, &AccessRule::owner_or_elevated(&tama)) {
        return errors::auth_error_to_response(e);
    }

    Json(tama).into_response()
}

pub async fn update_tama(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<TamaUpdate>, JsonRejection>,
) -> axum::response::Response {
    let id: TamaId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let tama = match services.tamas.get_tama(id).await {
        Ok(Some(tama)) => tama,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };
    if let Err(e) = authorize(&principal, &AccessRule::owner_or_elevated(&tama)) {
        return errors::auth_error_to_response(e);
    }

    let update = match dto::body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };
    if let Err(e) = update.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.tamas.update_tama(id, update).await {
        Ok(Some(tama)) => Json(tama).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_tama(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TamaId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let owner_id = match services.tamas.find_owner(id).await {
        Ok(Some(owner_id)) => owner_id,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };
    if let Err(e) = authorize(&principal, &AccessRule::DestructiveOwner { owner_id }) {
        return errors::auth_error_to_response(e);
    }

    match services.tamas.delete_tama(id).await {
        Ok(true) => {
            tracing::info!(user_id = %principal.user_id, tama_id = %id, "tama deleted");
            Json(serde_json::json!({ "message": "Tama deleted" })).into_response()
        }
        Ok(false) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}
