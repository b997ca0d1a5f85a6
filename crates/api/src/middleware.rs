use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use adminhub_audit::actions;
use adminhub_auth::{AuthnError, Principal};

use crate::app::AppState;
use crate::app::errors::ApiError;
use crate::context::ClientIp;

/// Identity recorded for requests that never authenticated.
pub const ANONYMOUS: &str = "anonymous";

/// Resolve the bearer token into a [`Principal`] backed by a live account.
///
/// The role is read from the account on every request. Any failure is a 401
/// and is recorded as a `TOKEN_REJECTED` auth event.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let client_ip = ClientIp::from_headers(req.headers());

    let principal = match resolve_principal(&state, req.headers()).await {
        Ok(principal) => principal,
        Err(Rejection::Unauthenticated(reason)) => {
            tracing::info!(reason = %reason, ip = client_ip.as_str(), "request rejected");
            state.audit.record_auth_event(
                ANONYMOUS,
                actions::auth::TOKEN_REJECTED,
                false,
                Some(client_ip.as_str()),
            );
            return ApiError::Unauthorized.into_response();
        }
        Err(Rejection::Failed(err)) => return err.into_response(),
    };

    req.extensions_mut().insert(principal);
    req.extensions_mut().insert(client_ip);

    next.run(req).await
}

enum Rejection {
    Unauthenticated(String),
    Failed(ApiError),
}

async fn resolve_principal(state: &AppState, headers: &HeaderMap) -> Result<Principal, Rejection> {
    let token = extract_bearer(headers).map_err(|e| Rejection::Unauthenticated(e.to_string()))?;

    let email = state
        .authenticator
        .authenticate(token, Utc::now())
        .map_err(|e| Rejection::Unauthenticated(e.to_string()))?;

    let account = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| Rejection::Failed(e.into()))?
        .ok_or_else(|| Rejection::Unauthenticated(format!("no account for {email}")))?;

    if !account.is_active {
        return Err(Rejection::Unauthenticated(format!("account {email} is inactive")));
    }

    Ok(Principal::new(account.id, account.email, account.role))
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthnError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthnError::MissingToken)?;

    let header = header
        .to_str()
        .map_err(|_| AuthnError::Malformed("authorization header is not ASCII".to_string()))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthnError::Malformed("expected 'Bearer' scheme".to_string()))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthnError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(AuthnError::MissingToken));

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(matches!(extract_bearer(&headers), Err(AuthnError::Malformed(_))));

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), Err(AuthnError::MissingToken));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Ok("abc.def"));
    }
}
