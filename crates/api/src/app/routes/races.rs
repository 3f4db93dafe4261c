use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use tama_infra::RaceRepository;

use crate::app::{errors, services::AppServices};

/// Public reference data; no token required.
pub async fn list_races(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.races.list_races().await {
        Ok(races) => Json(races).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
