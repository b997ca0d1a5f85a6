use adminhub_core::{Email, UserId};

use crate::Role;

/// A fully resolved principal for authorization decisions.
///
/// The role is carried as the name stored on the account, not as a parsed
/// [`Role`]: a stored value outside the catalog is still a valid principal,
/// it simply holds no permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    email: Email,
    role: String,
}

impl Principal {
    pub fn new(user_id: UserId, email: Email, role: impl Into<String>) -> Self {
        Self {
            user_id,
            email,
            role: role.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role_name(&self) -> &str {
        &self.role
    }

    /// The parsed role, or `None` when the stored name is not in the catalog.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}
