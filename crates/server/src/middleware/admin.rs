//! Admin access guard.
//!
//! A request is privileged when it carries either the shared `x-admin-key`
//! header or a bearer token whose `is_admin` claim is true.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::services::auth::Claims;
use crate::state::AppState;

/// Header carrying the shared admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// How the caller proved admin rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminIdentity {
    SharedKey,
    Token(Claims),
}

/// Extractor that requires admin access.
///
/// Rejects with 401 when no valid credential is present and 403 when a valid
/// token lacks the admin claim.
///
/// # Example
///
/// ```rust,ignore
/// async fn delete_product(
///     RequireAdmin(_): RequireAdmin,
///     Path(id): Path<String>,
/// ) -> Result<Json<Value>> { ... }
/// ```
#[derive(Debug)]
pub struct RequireAdmin(pub AdminIdentity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(key) = header_str(&parts.headers, ADMIN_KEY_HEADER)
            && keys_match(key, state.config().admin_key.expose_secret())
        {
            return Ok(Self(AdminIdentity::SharedKey));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Err(AppError::Unauthorized);
        };

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected admin token");
            AppError::Unauthorized
        })?;

        if !claims.is_admin {
            return Err(AppError::Forbidden);
        }

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(claims.sub.clone()),
                email: Some(claims.email.clone()),
                ..Default::default()
            }));
        });

        Ok(Self(AdminIdentity::Token(claims)))
    }
}

/// Compares without short-circuiting on the first differing byte.
fn keys_match(given: &str, expected: &str) -> bool {
    if given.len() != expected.len() {
        return false;
    }

    given
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
