//! # Apotheca API
//!
//! HTTP/JSON server for the pharmacy backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Server                                       │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► AuthUser ───► Routes ───► apotheca-db     │
//! │                   │            (JWT)           │                        │
//! │                   ▼                            ▼                        │
//! │              TraceLayer                 { success, data, message }      │
//! │                                                │                        │
//! │                              /api/ai ──► Assistant ──► chat completions │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The router is exposed as a library so integration tests can drive it
//! without binding a socket.

pub mod assistant;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use state::AppState;

/// Build the fully configured application: routes, middleware and state.
pub fn build_app(state: AppState) -> Router {
    routes::build_router()
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
