use axum::{Json, extract::Extension};

use adminhub_auth::Principal;

use crate::app::AppState;
use crate::app::dto::{HealthResponse, PermissionsResponse};

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "API is running",
    })
}

/// GET /permissions/me - the caller's role and effective permissions
pub async fn my_permissions(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<PermissionsResponse> {
    Json(PermissionsResponse::for_principal(&state.catalog, &principal))
}
