//! RBAC introspection endpoints.
//!
//! These answer "what can each role do?" and "why was I denied?" without
//! touching any store.

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::QueryRejection},
    routing::get,
};

use adminhub_auth::{AuthorizationExplanation, Permission, Principal};

use crate::app::AppState;
use crate::app::dto::{ExplainQuery, RolesResponse};
use crate::app::errors::ApiError;
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/explain", get(explain))
}

/// GET /rbac/roles - every role with its granted permissions
pub async fn list_roles(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<RolesResponse>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ViewUsers)?;
    Ok(Json(RolesResponse {
        roles: state.catalog.role_definitions(),
    }))
}

/// GET /rbac/explain?permission=X - explain the decision for the caller
pub async fn explain(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ExplainQuery>, QueryRejection>,
) -> Result<Json<AuthorizationExplanation>, ApiError> {
    let Query(query) = query?;
    let permission = query
        .permission
        .parse::<Permission>()
        .map_err(|e| ApiError::Validation(format!("{e}")))?;

    Ok(Json(state.catalog.explain(principal.role_name(), permission)))
}
