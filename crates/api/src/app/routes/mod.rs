use axum::{Router, routing::get};

pub mod auth;
pub mod races;
pub mod system;
pub mod tamas;
pub mod users;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/tamas", tamas::router())
}
