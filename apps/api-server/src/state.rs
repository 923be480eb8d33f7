//! Shared application state.

use std::sync::Arc;

use apotheca_db::Database;

use crate::assistant::{Assistant, AssistantError};
use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Cloned into every handler; the inner pieces are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub assistant: Arc<Assistant>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Fails only if the assistant's HTTP client cannot be built.
    pub fn new(db: Database, config: ApiConfig) -> Result<Self, AssistantError> {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        let assistant = Assistant::new(&config)?;
        Ok(AppState {
            db,
            jwt: Arc::new(jwt),
            assistant: Arc::new(assistant),
            config: Arc::new(config),
        })
    }
}
