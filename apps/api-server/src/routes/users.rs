//! Profile API for the signed-in user.

use apotheca_core::validation::{validate_display_name, validate_password};
use apotheca_core::{CoreError, User};
use apotheca_db::password::hash_password;
use apotheca_db::ProfileUpdate;
use axum::{extract::State, routing::get, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/me", get(get_me).put(update_me))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// GET /api/users/me
async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<ApiResponse<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&identity.user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(identity.user_id.clone()))?;

    Ok(ApiResponse::ok(user))
}

/// PUT /api/users/me - change display name and/or password
async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<User>> {
    if req.name.is_none() && req.password.is_none() {
        return Err(ApiError::InvalidArgument("No fields to update".to_string()));
    }

    if let Some(name) = &req.name {
        validate_display_name(name)?;
    }
    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let update = ProfileUpdate {
        name: req.name,
        password_hash,
    };
    let user = state
        .db
        .users()
        .update_profile(&identity.user_id, &update)
        .await?;

    info!(
        user_id = %user.id,
        name_changed = update.name.is_some(),
        password_changed = update.password_hash.is_some(),
        "Profile updated"
    );
    Ok(ApiResponse::ok_with_message(user, "Profile updated"))
}
