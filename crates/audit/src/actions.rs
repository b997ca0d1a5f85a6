//! Action tags written to the `Action` field.
//!
//! Downstream log queries filter on these values; treat them as stable.

pub const UPDATE_USER_ROLE: &str = "UPDATE_USER_ROLE";
pub const UPDATE_USER: &str = "UPDATE_USER";
pub const CREATE_USER: &str = "CREATE_USER";
pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";
pub const CONFIG_CHANGE: &str = "CONFIG_CHANGE";

/// Authentication event types.
pub mod auth {
    pub const LOGOUT: &str = "LOGOUT";
    pub const TOKEN_REJECTED: &str = "TOKEN_REJECTED";
}
