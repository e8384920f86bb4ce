//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! jandl admin create -e admin@jandl.shop -n "Shop Admin" -p '<password>'
//! ```
//!
//! The account can then log in through `POST /auth/login`; its token carries
//! the admin claim.

use thiserror::Error;

use jandl_core::{Email, EmailError};
use jandl_server::db::{PgUserStore, RepositoryError, UserStore};
use jandl_server::models::NewUser;
use jandl_server::services::auth::{self, AuthError};

use super::CommandError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Weak password or hashing failure.
    #[error("Password rejected: {0}")]
    Password(#[from] AuthError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin account.
///
/// An existing account with the same email is left untouched.
///
/// # Errors
///
/// Returns `AdminError` for an invalid email, a weak password or a database
/// failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    auth::validate_password(password)?;

    let pool = super::connect().await?;
    let users = PgUserStore::new(pool);

    if users.get_user_by_email(&email).await?.is_some() {
        tracing::warn!(%email, "Admin user already exists");
        return Ok(());
    }

    let user = users
        .create_user(NewUser {
            name: Some(name.to_owned()).filter(|n| !n.trim().is_empty()),
            email,
            password_hash: auth::hash_password(password)?,
            is_admin: true,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}
