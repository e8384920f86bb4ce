//! HS256 access tokens.
//!
//! Tokens are stateless: the admin guard trusts the `is_admin` claim of any
//! unexpired token signed with `JWT_SECRET`. There is no refresh or revocation.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

/// Signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Build keys from the shared secret; tokens live for `ttl_hours`.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.to_string(),
            is_admin: user.is_admin,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Check signature and expiry and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for any invalid or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jandl_core::{Email, UserId};

    use super::*;

    fn keys(secret: &str, ttl_hours: i64) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret.to_owned()), ttl_hours)
    }

    fn user(is_admin: bool) -> User {
        User {
            id: UserId::generate(),
            name: Some("Admin".to_owned()),
            email: Email::parse("admin@shop.test").unwrap(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("k7Qm2xVz9pL4sRt8wYb3nHc6jFd1gAe5", 24);
        let user = user(true);
        let claims = keys.verify(&keys.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert!(claims.is_admin);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = keys("k7Qm2xVz9pL4sRt8wYb3nHc6jFd1gAe5", 24)
            .issue(&user(true))
            .unwrap();
        let other = keys("Zx8Wv7Ut6Sr5Qp4On3Ml2Kj1Ih0Gf9Ed", 24);
        assert!(matches!(other.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn test_rejects_expired() {
        // Past the default 60s leeway.
        let keys = keys("k7Qm2xVz9pL4sRt8wYb3nHc6jFd1gAe5", -1);
        let token = keys.issue(&user(false)).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", keys("k7Qm2xVz9pL4sRt8wYb3nHc6jFd1gAe5", 1));
        assert!(!debug.contains("k7Qm"));
        assert!(debug.contains("REDACTED"));
    }
}
