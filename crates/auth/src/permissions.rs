use std::collections::BTreeSet;

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Atomic capability checked by the decision function.
///
/// Ownership checks ("is this my own profile") are modelled as capabilities
/// too, so every decision stays a pure lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewConfig,
    EditConfig,
    ViewUsers,
    EditUsers,
    ChangeRoles,
    ViewOwnProfile,
    EditOwnProfile,
}

/// Set of granted permissions (ordered for stable output).
pub type PermissionSet = BTreeSet<Permission>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission '{0}'")]
pub struct PermissionParseError(pub String);

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::ViewConfig,
        Permission::EditConfig,
        Permission::ViewUsers,
        Permission::EditUsers,
        Permission::ChangeRoles,
        Permission::ViewOwnProfile,
        Permission::EditOwnProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewConfig => "view_config",
            Permission::EditConfig => "edit_config",
            Permission::ViewUsers => "view_users",
            Permission::EditUsers => "edit_users",
            Permission::ChangeRoles => "change_roles",
            Permission::ViewOwnProfile => "view_own_profile",
            Permission::EditOwnProfile => "edit_own_profile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::ViewConfig => "View system configuration",
            Permission::EditConfig => "Create and update system configuration",
            Permission::ViewUsers => "List user accounts",
            Permission::EditUsers => "Create and update other user accounts",
            Permission::ChangeRoles => "Change the role of a user account",
            Permission::ViewOwnProfile => "View own profile",
            Permission::EditOwnProfile => "Update own profile",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Permission::ViewConfig | Permission::EditConfig => "config",
            Permission::ViewUsers | Permission::EditUsers | Permission::ChangeRoles => "users",
            Permission::ViewOwnProfile | Permission::EditOwnProfile => "profile",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PermissionParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_parse_back() {
        let names: BTreeSet<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names.len(), Permission::ALL.len());

        for perm in Permission::ALL {
            assert_eq!(perm.as_str().parse::<Permission>().unwrap(), perm);
            assert_eq!(serde_json::to_value(perm).unwrap(), perm.as_str());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "delete_everything".parse::<Permission>(),
            Err(PermissionParseError("delete_everything".to_string()))
        );
    }
}
