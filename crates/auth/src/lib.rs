//! `adminhub-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows the
//! fixed role/permission catalog, the decision function over it, and the
//! shape of an authenticated principal.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{
    AuthorizationExplanation, AuthzError, DenialKind, DenialReason, PermissionDefinition,
    RoleDefinition, RolePermissions,
};
pub use claims::{AuthnError, Authenticator, JwtClaims, TokenValidationError, validate_claims};
pub use permissions::{Permission, PermissionParseError, PermissionSet};
pub use principal::Principal;
pub use roles::{Role, RoleParseError};
pub use user::{AccountUpdate, NewUser, Profile, ProfileUpdate, UserAccount};
