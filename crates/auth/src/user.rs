//! User account model for identity management.
//!
//! Accounts are plain records mutated by the API handlers; the functions here
//! validate input and report which fields genuinely changed so the audit
//! trail records actual changes rather than requested ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adminhub_core::{DomainError, Email, UserId};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Extended profile attached to a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub date_of_birth: Option<String>,
    pub avatar_url: Option<String>,
}

/// Partial profile update.
///
/// `None` leaves a field untouched; an empty (or all-whitespace) string
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub date_of_birth: Option<String>,
}

impl ProfileUpdate {
    fn fields(&self) -> [(&'static str, &Option<String>, usize); 8] {
        [
            ("full_name", &self.full_name, 255),
            ("phone", &self.phone, 50),
            ("address", &self.address, 500),
            ("city", &self.city, 100),
            ("country", &self.country, 100),
            ("department", &self.department, 100),
            ("job_title", &self.job_title, 100),
            ("date_of_birth", &self.date_of_birth, 20),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value, _)| value.is_none())
    }

    /// Check column limits before anything is written.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value, max) in self.fields() {
            if let Some(v) = value {
                if v.trim().chars().count() > max {
                    return Err(DomainError::validation(format!(
                        "{name} must be at most {max} characters"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply onto `profile`, returning the names of fields whose value changed.
    pub fn apply_to(&self, profile: &mut Profile) -> Vec<&'static str> {
        let mut changed = Vec::new();
        set_field(&mut profile.full_name, &self.full_name, "full_name", &mut changed);
        set_field(&mut profile.phone, &self.phone, "phone", &mut changed);
        set_field(&mut profile.address, &self.address, "address", &mut changed);
        set_field(&mut profile.city, &self.city, "city", &mut changed);
        set_field(&mut profile.country, &self.country, "country", &mut changed);
        set_field(&mut profile.department, &self.department, "department", &mut changed);
        set_field(&mut profile.job_title, &self.job_title, "job_title", &mut changed);
        set_field(&mut profile.date_of_birth, &self.date_of_birth, "date_of_birth", &mut changed);
        changed
    }
}

fn set_field(
    slot: &mut Option<String>,
    update: &Option<String>,
    name: &'static str,
    changed: &mut Vec<&'static str>,
) {
    let Some(raw) = update else {
        return;
    };

    let trimmed = raw.trim();
    let next = (!trimmed.is_empty()).then(|| trimmed.to_string());

    if *slot != next {
        *slot = next;
        changed.push(name);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
///
/// `role` keeps the stored name verbatim. Assignment only ever writes catalog
/// roles, but rows written by other tools may hold anything; such accounts
/// resolve to no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: Email,
    pub role: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Committed updates so far. Stores refuse a write whose version is stale.
    #[serde(default, skip_serializing)]
    pub version: i64,
}

impl UserAccount {
    pub fn new(email: Email, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email,
            role: role.as_str().to_string(),
            is_active: true,
            profile: Profile::default(),
            created_at: now,
            updated_at: None,
            version: 0,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    /// Assign `role`, returning the previous role name if it changed.
    pub fn assign_role(&mut self, role: Role, now: DateTime<Utc>) -> Option<String> {
        if self.role == role.as_str() {
            return None;
        }
        let old = std::mem::replace(&mut self.role, role.as_str().to_string());
        self.updated_at = Some(now);
        Some(old)
    }

    /// Apply a self-service profile update.
    pub fn update_profile(
        &mut self,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<Vec<&'static str>, DomainError> {
        update.validate()?;
        let changed = update.apply_to(&mut self.profile);
        if !changed.is_empty() {
            self.updated_at = Some(now);
        }
        Ok(changed)
    }

    /// Apply an administrative update (profile fields + activation flag).
    pub fn apply_update(
        &mut self,
        update: &AccountUpdate,
        now: DateTime<Utc>,
    ) -> Result<Vec<&'static str>, DomainError> {
        update.profile.validate()?;
        let mut changed = update.profile.apply_to(&mut self.profile);

        if let Some(active) = update.is_active {
            if active != self.is_active {
                self.is_active = active;
                changed.push("is_active");
            }
        }

        if !changed.is_empty() {
            self.updated_at = Some(now);
        }
        Ok(changed)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: Email,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

impl NewUser {
    /// True when the body names any role other than [`Role::DEFAULT`],
    /// including names that are not roles at all.
    pub fn assigns_non_default_role(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|name| name.parse::<Role>().ok() != Some(Role::DEFAULT))
    }

    /// Validate and build the account; an absent role means [`Role::DEFAULT`].
    pub fn into_account(self, now: DateTime<Utc>) -> Result<UserAccount, DomainError> {
        let role = match self.role.as_deref() {
            None => Role::DEFAULT,
            Some(name) => name
                .parse::<Role>()
                .map_err(|e| DomainError::validation(e.to_string()))?,
        };

        let mut account = UserAccount::new(self.email, role, now);
        account.update_profile(&self.profile, now)?;
        account.updated_at = None;
        Ok(account)
    }
}

/// Administrative update of another account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn account() -> UserAccount {
        UserAccount::new(Email::parse("alice@example.com").unwrap(), Role::User, now())
    }

    #[test]
    fn new_account_defaults() {
        let a = account();
        assert_eq!(a.role, "user");
        assert_eq!(a.role(), Some(Role::User));
        assert!(a.is_active);
        assert_eq!(a.profile, Profile::default());
        assert!(a.updated_at.is_none());
    }

    #[test]
    fn assign_role_reports_old_role_only_on_change() {
        let mut a = account();
        assert_eq!(a.assign_role(Role::Manager, now()), Some("user".to_string()));
        assert_eq!(a.role, "manager");
        assert!(a.updated_at.is_some());

        assert_eq!(a.assign_role(Role::Manager, now()), None);
    }

    #[test]
    fn profile_update_lists_only_changed_fields() {
        let mut a = account();
        a.profile.city = Some("Oslo".to_string());

        let update = ProfileUpdate {
            full_name: Some("Alice Smith".to_string()),
            city: Some("Oslo".to_string()),
            phone: None,
            ..Default::default()
        };

        let changed = a.update_profile(&update, now()).unwrap();
        assert_eq!(changed, vec!["full_name"]);
        assert_eq!(a.profile.full_name.as_deref(), Some("Alice Smith"));
    }

    #[test]
    fn blank_value_clears_a_field() {
        let mut a = account();
        a.profile.phone = Some("555-0100".to_string());

        let update = ProfileUpdate {
            phone: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(a.update_profile(&update, now()).unwrap(), vec!["phone"]);
        assert!(a.profile.phone.is_none());
    }

    #[test]
    fn oversized_field_is_rejected_without_changes() {
        let mut a = account();
        let update = ProfileUpdate {
            full_name: Some("ok".to_string()),
            date_of_birth: Some("x".repeat(21)),
            ..Default::default()
        };

        let err = a.update_profile(&update, now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(a.profile.full_name.is_none());
    }

    #[test]
    fn admin_update_tracks_activation() {
        let mut a = account();
        let update = AccountUpdate {
            is_active: Some(false),
            profile: ProfileUpdate {
                department: Some("Ops".to_string()),
                ..Default::default()
            },
        };

        let changed = a.apply_update(&update, now()).unwrap();
        assert_eq!(changed, vec!["department", "is_active"]);
        assert!(!a.is_active);
    }

    #[test]
    fn new_user_rejects_unknown_role() {
        let input = NewUser {
            email: Email::parse("bob@example.com").unwrap(),
            role: Some("root".to_string()),
            profile: ProfileUpdate::default(),
        };
        assert!(matches!(input.into_account(now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn new_user_defaults_to_user_role() {
        let input: NewUser =
            serde_json::from_str(r#"{"email":"Bob@Example.com","full_name":"Bob"}"#).unwrap();
        let account = input.into_account(now()).unwrap();
        assert_eq!(account.role, "user");
        assert_eq!(account.email.as_str(), "bob@example.com");
        assert_eq!(account.profile.full_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn only_the_default_role_counts_as_unprivileged() {
        let with_role = |role: Option<&str>| NewUser {
            email: Email::parse("bob@example.com").unwrap(),
            role: role.map(str::to_string),
            profile: ProfileUpdate::default(),
        };

        assert!(!with_role(None).assigns_non_default_role());
        assert!(!with_role(Some("user")).assigns_non_default_role());
        assert!(with_role(Some("admin")).assigns_non_default_role());
        assert!(with_role(Some("viewer")).assigns_non_default_role());
        assert!(with_role(Some("root")).assigns_non_default_role());
    }

    #[test]
    fn account_serializes_flat_profile() {
        let mut a = account();
        a.profile.job_title = Some("Engineer".to_string());
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["job_title"], "Engineer");
        assert_eq!(value["email"], "alice@example.com");
        assert_eq!(value["role"], "user");
        assert!(value.get("version").is_none());
    }
}
