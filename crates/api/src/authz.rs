//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching any store, so a denied request
//! never mutates state and never reaches the audit trail.

use adminhub_auth::{Permission, Principal, RolePermissions};

use crate::app::errors::ApiError;

/// Check that `principal`'s current role grants `permission`.
pub fn require(
    catalog: &RolePermissions,
    principal: &Principal,
    permission: Permission,
) -> Result<(), ApiError> {
    catalog.require(principal, permission)?;
    Ok(())
}
