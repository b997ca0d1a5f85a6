use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role assigned to a user account.
///
/// The set is closed: adding a role is a code change, and every `match` over
/// `Role` has to acknowledge it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Editor,
    User,
    Viewer,
}

/// A role name outside the fixed enumeration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role '{0}' (expected one of: admin, manager, editor, user, viewer)")]
pub struct RoleParseError(pub String);

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Editor,
        Role::User,
        Role::Viewer,
    ];

    /// Role given to newly created accounts.
    pub const DEFAULT: Role = Role::User;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Editor => "editor",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full administrator: configuration, users and role assignment",
            Role::Manager => "Reads configuration and manages user accounts",
            Role::Editor => "Browses the user directory and maintains own profile",
            Role::User => "Maintains own profile",
            Role::Viewer => "Read-only access to own profile",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}
