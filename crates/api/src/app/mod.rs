//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and security wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and extraction helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        codec: services.codec(),
    };

    // Protected routes: every request carries a validated principal.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/", get(routes::system::banner))
        .route("/health", get(routes::system::health))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/api/races", get(routes::races::list_races))
        .nest("/api", protected)
        .layer(Extension(services))
        .layer(CorsLayer::permissive())
}
