//! Account route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use jandl_core::UserId;

use crate::error::{AppJson, Result};
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration payload.
///
/// Fields are optional so a missing email or password gets the specific
/// "required" message instead of a generic body error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of the logged-in user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            is_admin: user.is_admin,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// `POST /auth/register`
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(form): AppJson<RegisterRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.users(), state.tokens());
    let user = auth
        .register(
            form.name,
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
        )
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(Json(json!({ "success": true, "userId": user.id })))
}

/// `POST /auth/login`
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(form): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.users(), state.tokens());
    let (user, token) = auth
        .login(
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
        )
        .await?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}
