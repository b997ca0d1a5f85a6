//! HS256 bearer-token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use adminhub_auth::{AuthnError, Authenticator, JwtClaims, validate_claims};
use adminhub_core::Email;

/// Verifies HS256 tokens signed with a shared secret.
///
/// Signature and algorithm are checked by `jsonwebtoken`; the time window is
/// checked by [`validate_claims`] against the caller-supplied `now`.
#[derive(Clone)]
pub struct Hs256Authenticator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl Authenticator for Hs256Authenticator {
    fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<Email, AuthnError> {
        if token.trim().is_empty() {
            return Err(AuthnError::MissingToken);
        }

        let claims = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthnError::Malformed(e.to_string()))?
            .claims;

        validate_claims(&claims, now)?;

        Email::parse(&claims.sub).map_err(|_| AuthnError::InvalidSubject)
    }
}
