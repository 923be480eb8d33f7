//! Health API. Public.

use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub database: &'static str,
    pub users: i64,
    pub drugs: i64,
    pub sales: i64,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health - database reachability and row counts
async fn health(State(state): State<AppState>) -> ApiResult<ApiResponse<HealthReport>> {
    if !state.db.health_check().await {
        return Err(ApiError::Internal("database unreachable".to_string()));
    }

    let counts = state.db.stats().table_counts().await?;

    Ok(ApiResponse::ok_with_message(
        HealthReport {
            database: "connected",
            users: counts.users,
            drugs: counts.drugs,
            sales: counts.sales,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        },
        "API is running",
    ))
}
