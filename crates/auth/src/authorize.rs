use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::{Permission, PermissionSet, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' is missing permission '{permission}'")]
    Forbidden { role: String, permission: Permission },
}

/// Fixed role → permission catalog.
///
/// Built once at startup and shared read-only (`Arc<RolePermissions>`); there
/// are no setters. Every decision in the system goes through [`authorize`],
/// the `can_*` predicates included.
///
/// [`authorize`]: RolePermissions::authorize
#[derive(Debug, Clone)]
pub struct RolePermissions {
    grants: HashMap<Role, PermissionSet>,
    none: PermissionSet,
}

impl RolePermissions {
    /// The standard catalog.
    pub fn standard() -> Self {
        let grants = Role::ALL
            .into_iter()
            .map(|role| (role, standard_grants(role)))
            .collect();

        Self {
            grants,
            none: PermissionSet::new(),
        }
    }

    /// Permissions granted to a role.
    pub fn permissions_of(&self, role: Role) -> &PermissionSet {
        self.grants.get(&role).unwrap_or(&self.none)
    }

    /// Permissions granted to a role given by its stored name.
    ///
    /// An unrecognized name is valid input meaning "no rights": the result is
    /// the empty set, never an error.
    pub fn permissions_of_name(&self, role: &str) -> &PermissionSet {
        match role.parse::<Role>() {
            Ok(role) => self.permissions_of(role),
            Err(_) => &self.none,
        }
    }

    /// The decision function: `permission ∈ permissions_of_name(role)`.
    ///
    /// - No IO
    /// - No panics
    /// - No state
    pub fn authorize(&self, role: &str, permission: Permission) -> bool {
        self.permissions_of_name(role).contains(&permission)
    }

    /// Handler-facing form of [`authorize`](Self::authorize).
    pub fn require(&self, principal: &Principal, permission: Permission) -> Result<(), AuthzError> {
        if self.authorize(principal.role_name(), permission) {
            Ok(())
        } else {
            tracing::debug!(
                user = %principal.email(),
                role = principal.role_name(),
                permission = permission.as_str(),
                "authorization denied"
            );
            Err(AuthzError::Forbidden {
                role: principal.role_name().to_string(),
                permission,
            })
        }
    }

    pub fn can_access_config(&self, role: &str) -> bool {
        self.authorize(role, Permission::ViewConfig)
    }

    pub fn can_edit_config(&self, role: &str) -> bool {
        self.authorize(role, Permission::EditConfig)
    }

    pub fn can_view_users(&self, role: &str) -> bool {
        self.authorize(role, Permission::ViewUsers)
    }

    pub fn can_edit_users(&self, role: &str) -> bool {
        self.authorize(role, Permission::EditUsers)
    }

    pub fn can_change_roles(&self, role: &str) -> bool {
        self.authorize(role, Permission::ChangeRoles)
    }

    pub fn can_view_own_profile(&self, role: &str) -> bool {
        self.authorize(role, Permission::ViewOwnProfile)
    }

    pub fn can_edit_own_profile(&self, role: &str) -> bool {
        self.authorize(role, Permission::EditOwnProfile)
    }

    /// Roles whose catalog entry contains `permission`.
    pub fn roles_granting(&self, permission: Permission) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.permissions_of(*role).contains(&permission))
            .collect()
    }

    /// Catalog view of every role (for display).
    pub fn role_definitions(&self) -> Vec<RoleDefinition> {
        Role::ALL
            .into_iter()
            .map(|role| RoleDefinition {
                name: role,
                permissions: self.permissions_of(role).iter().copied().collect(),
                description: role.description(),
            })
            .collect()
    }

    /// Catalog view of every permission (for display).
    pub fn permission_definitions(&self) -> Vec<PermissionDefinition> {
        Permission::ALL
            .into_iter()
            .map(|permission| PermissionDefinition {
                name: permission,
                description: permission.description(),
                category: permission.category(),
                granted_to: self.roles_granting(permission),
            })
            .collect()
    }

    /// Explain why `role` is (or would be) allowed or denied `required`.
    pub fn explain(&self, role: &str, required: Permission) -> AuthorizationExplanation {
        let recognized = role.parse::<Role>().is_ok();
        let effective: Vec<Permission> = self.permissions_of_name(role).iter().copied().collect();
        let granted = effective.contains(&required);

        if granted {
            return AuthorizationExplanation {
                required_permission: required,
                granted,
                reason: format!("Role '{role}' grants permission '{required}'"),
                role: role.to_string(),
                recognized_role: recognized,
                effective_permissions: effective,
                denial_reason: None,
            };
        }

        let granting: Vec<&'static str> = self
            .roles_granting(required)
            .into_iter()
            .map(|r| r.as_str())
            .collect();

        let denial_reason = if recognized {
            DenialReason {
                kind: DenialKind::MissingPermission,
                message: format!("Missing required permission: '{required}'"),
                suggestions: vec![format!(
                    "Ask an administrator to assign one of these roles: {}",
                    granting.join(", ")
                )],
            }
        } else {
            DenialReason {
                kind: DenialKind::UnknownRole,
                message: format!("Role '{role}' is not part of the role catalog and grants nothing"),
                suggestions: vec![
                    "Assign one of: admin, manager, editor, user, viewer".to_string(),
                ],
            }
        };

        AuthorizationExplanation {
            required_permission: required,
            granted,
            reason: format!(
                "Role '{role}' does not grant permission '{required}'. Current permissions: {:?}",
                effective.iter().map(|p| p.as_str()).collect::<Vec<_>>()
            ),
            role: role.to_string(),
            recognized_role: recognized,
            effective_permissions: effective,
            denial_reason: Some(denial_reason),
        }
    }
}

impl Default for RolePermissions {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_grants(role: Role) -> PermissionSet {
    use Permission::*;

    let grants: &[Permission] = match role {
        Role::Admin => &Permission::ALL,
        Role::Manager => &[ViewConfig, ViewUsers, EditUsers, ViewOwnProfile, EditOwnProfile],
        Role::Editor => &[ViewUsers, ViewOwnProfile, EditOwnProfile],
        Role::User => &[ViewOwnProfile, EditOwnProfile],
        // Read only: cannot edit own profile.
        Role::Viewer => &[ViewOwnProfile],
    };

    grants.iter().copied().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: Permission,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub role: String,
    pub recognized_role: bool,
    pub effective_permissions: Vec<Permission>,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UnknownRole,
    MissingPermission,
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub permissions: Vec<Permission>,
    pub description: &'static str,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: Permission,
    pub description: &'static str,
    pub category: &'static str,
    pub granted_to: Vec<Role>,
}
