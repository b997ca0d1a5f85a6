//! HTTP API application wiring (Axum router + shared state).
//!
//! - `services.rs`: store/audit wiring and startup tasks
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use adminhub_audit::AuditEmitter;
use adminhub_auth::{Authenticator, RolePermissions};
use adminhub_infra::{ConfigRepository, UserRepository};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Everything a handler may need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub configs: Arc<dyn ConfigRepository>,
    pub catalog: Arc<RolePermissions>,
    pub audit: AuditEmitter,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: AppState) -> Router {
    // Protected routes: require a resolved principal.
    let protected = routes::router()
        .layer(Extension(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected);

    Router::new().nest("/api", api).layer(ServiceBuilder::new())
}
