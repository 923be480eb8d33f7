//! Auth API: login and self-registration. Public.

use apotheca_core::validation::{validate_display_name, validate_password, validate_username};
use apotheca_core::{Role, User};
use apotheca_db::password::{hash_password, verify_password};
use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidArgument(
            "Username and password are required".to_string(),
        ));
    }

    let Some(user) = state.db.users().find_by_username(username).await? else {
        warn!(username = %username, "Login failed: unknown user");
        return Err(ApiError::invalid_credentials());
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(username = %username, "Login failed: wrong password");
        return Err(ApiError::invalid_credentials());
    }

    let token = state.jwt.generate_token(&user)?;
    info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(ApiResponse::ok_with_message(
        LoginResponse { token, user },
        "Login successful",
    ))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<User>> {
    let username = req.username.trim();
    validate_username(username)?;
    validate_password(&req.password)?;
    validate_display_name(&req.name)?;

    let role = req.role.unwrap_or_default();
    if role == Role::Admin && !state.config.allow_admin_signup {
        warn!(username = %username, "Refused admin self-registration");
        return Err(ApiError::PermissionDenied(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let hash = hash_password(&req.password)?;
    let user = state
        .db
        .users()
        .insert(username, &hash, &req.name, role)
        .await?;

    Ok(ApiResponse::ok_with_message(user, "Registration successful"))
}
