//! System configuration routes.

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use adminhub_auth::{Permission, Principal};
use adminhub_infra::{ConfigEntry, ConfigWrite};

use crate::app::AppState;
use crate::app::dto::ConfigValueRequest;
use crate::app::errors::ApiError;
use crate::authz;

/// Old value recorded when a write creates the key.
pub const NEW_ENTRY_MARKER: &str = "(new)";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_config).post(create_config))
        .route("/:key", get(get_config).put(update_config))
}

/// GET /config
pub async fn list_config(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ConfigEntry>>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ViewConfig)?;
    Ok(Json(state.configs.list().await?))
}

/// GET /config/:key
pub async fn get_config(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Path(key): Path<String>,
) -> Result<Json<ConfigEntry>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ViewConfig)?;
    state
        .configs
        .get(&key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("configuration key '{key}' not found")))
}

/// PUT /config/:key - create or update one entry
pub async fn update_config(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Path(key): Path<String>,
    payload: Result<Json<ConfigValueRequest>, JsonRejection>,
) -> Result<Json<ConfigEntry>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::EditConfig)?;
    let Json(body) = payload?;

    let write = ConfigWrite {
        key,
        value: body.value,
        description: body.description,
    };
    write.validate()?;

    let result = state.configs.upsert(write, Utc::now()).await?;
    let old_value = result
        .previous
        .as_ref()
        .map_or(NEW_ENTRY_MARKER, |prev| prev.value.as_str());

    state.audit.record_config_change(
        principal.email().as_str(),
        &result.current.key,
        old_value,
        &result.current.value,
    );

    Ok(Json(result.current))
}

/// POST /config - create a new entry; the key must not exist yet
pub async fn create_config(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ConfigWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<ConfigEntry>), ApiError> {
    authz::require(&state.catalog, &principal, Permission::EditConfig)?;
    let Json(write) = payload?;
    write.validate()?;

    let entry = state.configs.insert(write, Utc::now()).await?;
    state.audit.record_config_change(
        principal.email().as_str(),
        &entry.key,
        NEW_ENTRY_MARKER,
        &entry.value,
    );

    Ok((StatusCode::CREATED, Json(entry)))
}
