use axum::{Router, extract::Extension, http::StatusCode, routing::post};

use adminhub_audit::actions;
use adminhub_auth::Principal;

use crate::app::AppState;
use crate::context::ClientIp;

pub fn router() -> Router {
    Router::new().route("/logout", post(logout))
}

/// POST /auth/logout
///
/// Tokens are stateless, so this only records the event; the client drops
/// its token.
pub async fn logout(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(client_ip): Extension<ClientIp>,
) -> StatusCode {
    state.audit.record_auth_event(
        principal.email().as_str(),
        actions::auth::LOGOUT,
        true,
        Some(client_ip.as_str()),
    );
    StatusCode::NO_CONTENT
}
