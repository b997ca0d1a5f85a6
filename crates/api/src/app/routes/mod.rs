use axum::{Router, routing::get};

pub mod auth;
pub mod config;
pub mod rbac;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/permissions/me", get(system::my_permissions))
        .nest("/users", users::router())
        .nest("/config", config::router())
        .nest("/rbac", rbac::router())
        .nest("/auth", auth::router())
}
