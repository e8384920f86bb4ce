//! User account types.
//!
//! Accounts back the admin guard's token path. The password hash never
//! leaves the repository layer except through `UserStore::get_with_password`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use jandl_core::{Email, UserId};

/// A registered user (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Email,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub is_admin: bool,
}
