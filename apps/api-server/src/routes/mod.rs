//! Route registration.
//!
//! Each module exposes a `router()` with absolute `/api/...` paths; they are
//! merged here. Everything except health, login and register takes an
//! [`AuthUser`](crate::auth::AuthUser) and so requires a bearer token.

use axum::Router;

use crate::state::AppState;

pub mod ai;
pub mod auth;
pub mod drugs;
pub mod health;
pub mod sales;
pub mod stats;
pub mod users;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<AppState> {
    Router::new()
        // Public
        .merge(health::router())
        .merge(auth::router())
        // Authenticated
        .merge(users::router())
        .merge(drugs::router())
        .merge(sales::router())
        .merge(stats::router())
        .merge(ai::router())
}
