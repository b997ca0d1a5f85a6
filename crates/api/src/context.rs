use axum::http::HeaderMap;

/// Value recorded when the client address cannot be determined.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// Client address of a request, as reported by the fronting proxy.
///
/// Inserted by the auth middleware next to the resolved
/// [`Principal`](adminhub_auth::Principal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(String);

impl ClientIp {
    /// First hop of `X-Forwarded-For`, else `X-Real-IP`, else `"unknown"`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self(
            forwarded
                .or_else(real_ip)
                .unwrap_or(UNKNOWN_CLIENT_IP)
                .to_string(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
