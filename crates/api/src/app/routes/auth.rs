use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use tama_auth::NewUser;

use crate::app::{dto, errors, services::AppServices};

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> axum::response::Response {
    let new_user = match dto::body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.auth.register(new_user, Utc::now()).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "message": "User created" })),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services
        .auth
        .login(&body.user_name, &body.password, Utc::now())
        .await
    {
        Ok(token) => Json(serde_json::json!({ "token": token })).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
