use std::sync::Arc;

use axum::{extract::State, http::header::AUTHORIZATION, middleware::Next, response::Response};
use chrono::Utc;

use tama_auth::{AuthError, TokenCodec, authenticate_request};

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<dyn TokenCodec>,
}

/// Validate the request's token and bind the caller's [`tama_auth::Principal`]
/// into the request extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match req.headers().get(AUTHORIZATION) {
        None => authenticate_request(state.codec.as_ref(), None, Utc::now()),
        Some(value) => match value.to_str() {
            Ok(header) => authenticate_request(state.codec.as_ref(), Some(header), Utc::now()),
            Err(_) => Err(AuthError::InvalidToken),
        },
    };

    let principal = match principal {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(
                method = %req.method(),
                path = %req.uri().path(),
                error = %e,
                "request rejected"
            );
            return errors::auth_error_to_response(e);
        }
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}
