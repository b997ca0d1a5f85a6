//! User account routes: self-service profile and administration.
//!
//! Every mutating handler authorizes first, writes second and records the
//! audit event last, describing the values actually committed. Writes carry
//! the version they were loaded at, so a concurrent change surfaces as 409
//! instead of being overwritten.

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, put},
};
use chrono::Utc;
use serde_json::json;

use adminhub_audit::{actions, details};
use adminhub_auth::{AccountUpdate, NewUser, Permission, Principal, ProfileUpdate, Role, UserAccount};
use adminhub_core::UserId;

use crate::app::AppState;
use crate::app::dto::RoleChangeRequest;
use crate::app::errors::ApiError;
use crate::authz;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_me).put(update_me))
        .route("/:id", put(update_user))
        .route("/:id/role", put(change_role))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /users/me
pub async fn get_me(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserAccount>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ViewOwnProfile)?;
    Ok(Json(load(&state, principal.user_id()).await?))
}

/// PUT /users/me - update the caller's own profile
pub async fn update_me(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserAccount>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::EditOwnProfile)?;
    let Json(update) = payload?;

    let mut account = load(&state, principal.user_id()).await?;
    let changed = account.update_profile(&update, Utc::now())?;
    if changed.is_empty() {
        return Ok(Json(account));
    }

    let account = state.users.update(account).await?;
    state.audit.record_admin_action(
        principal.email().as_str(),
        actions::UPDATE_PROFILE,
        None,
        None,
        Some(details(json!({ "fields_updated": changed }))),
    );

    Ok(Json(account))
}

/// GET /users - list all accounts
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ViewUsers)?;
    Ok(Json(state.users.list().await?))
}

/// POST /users - create an account
///
/// Naming a role other than the default also takes `change_roles`.
pub async fn create_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserAccount>), ApiError> {
    authz::require(&state.catalog, &principal, Permission::EditUsers)?;
    let Json(new_user) = payload?;
    if new_user.assigns_non_default_role() {
        authz::require(&state.catalog, &principal, Permission::ChangeRoles)?;
    }

    let account = new_user.into_account(Utc::now())?;
    let account = state.users.insert(account).await?;

    state.audit.record_admin_action(
        principal.email().as_str(),
        actions::CREATE_USER,
        None,
        Some(account.email.as_str()),
        Some(details(json!({ "role": account.role }))),
    );

    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /users/:id - administrative update of another account
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<AccountUpdate>, JsonRejection>,
) -> Result<Json<UserAccount>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::EditUsers)?;
    let user_id = id.parse::<UserId>()?;
    let Json(update) = payload?;

    let mut account = load(&state, user_id).await?;
    let changed = account.apply_update(&update, Utc::now())?;
    if changed.is_empty() {
        return Ok(Json(account));
    }

    let account = state.users.update(account).await?;
    state.audit.record_admin_action(
        principal.email().as_str(),
        actions::UPDATE_USER,
        None,
        Some(account.email.as_str()),
        Some(details(json!({ "fields_updated": changed }))),
    );

    Ok(Json(account))
}

/// PUT /users/:id/role - assign a role
pub async fn change_role(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Json<UserAccount>, ApiError> {
    authz::require(&state.catalog, &principal, Permission::ChangeRoles)?;
    let user_id = id.parse::<UserId>()?;
    let Json(body) = payload?;
    let role = body.role.parse::<Role>()?;

    let mut account = load(&state, user_id).await?;
    let Some(old_role) = account.assign_role(role, Utc::now()) else {
        return Ok(Json(account));
    };

    let account = state.users.update(account).await?;
    tracing::info!(
        actor = %principal.email(),
        user = %account.email,
        old_role = %old_role,
        new_role = role.as_str(),
        "role changed"
    );
    state.audit.record_admin_action(
        principal.email().as_str(),
        actions::UPDATE_USER_ROLE,
        None,
        Some(account.email.as_str()),
        Some(details(json!({ "old_role": old_role, "new_role": role.as_str() }))),
    );

    Ok(Json(account))
}

async fn load(state: &AppState, id: UserId) -> Result<UserAccount, ApiError> {
    state
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))
}
