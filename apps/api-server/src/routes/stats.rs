//! Dashboard statistics API.

use apotheca_core::DashboardStats;
use axum::{extract::State, routing::get, Router};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(dashboard))
}

/// GET /api/stats
async fn dashboard(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> ApiResult<ApiResponse<DashboardStats>> {
    let stats = state.db.stats().dashboard().await?;
    Ok(ApiResponse::ok(stats))
}
