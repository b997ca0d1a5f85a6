use serde::{Deserialize, Serialize};

use adminhub_auth::{Permission, Principal, RoleDefinition, RolePermissions};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

/// Body of `PUT /config/{key}`; the key comes from the path.
#[derive(Debug, Deserialize)]
pub struct ConfigValueRequest {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// The caller's effective rights.
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub email: String,
    pub role: String,
    pub permissions: Vec<Permission>,
}

impl PermissionsResponse {
    pub fn for_principal(catalog: &RolePermissions, principal: &Principal) -> Self {
        Self {
            email: principal.email().to_string(),
            role: principal.role_name().to_string(),
            permissions: catalog
                .permissions_of_name(principal.role_name())
                .iter()
                .copied()
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<RoleDefinition>,
}
