use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tama_auth::{AuthError, StoreError};
use tama_core::DomainError;

/// Map an auth-boundary failure onto a status code and error body.
///
/// Server faults are logged with their detail and answered generically.
pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
        AuthError::DuplicateIdentifier => json_error(
            StatusCode::CONFLICT,
            "duplicate_identifier",
            "identifier already exists",
        ),
        AuthError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid credentials",
        ),
        AuthError::MissingToken => json_error(StatusCode::UNAUTHORIZED, "missing_token", "missing token"),
        AuthError::InvalidToken => json_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid token"),
        AuthError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient permissions"),
        AuthError::Storage(detail) => {
            tracing::error!(error = %detail, "storage failure");
            internal_error()
        }
        AuthError::Internal(detail) => {
            tracing::error!(error = %detail, "internal failure");
            internal_error()
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => not_found(),
        other => auth_error_to_response(other.into()),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    auth_error_to_response(err.into())
}

pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
