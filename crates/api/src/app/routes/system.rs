use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use tama_auth::Principal;

pub async fn banner() -> &'static str {
    "TamagoShit API"
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<Principal>) -> impl IntoResponse {
    Json(principal)
}
