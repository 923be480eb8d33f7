//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Secret used when `JWT_SECRET` is unset. Only fit for local development.
pub const DEV_JWT_SECRET: &str = "apotheca-dev-secret-change-in-production";

/// Any OpenAI-compatible chat-completions service.
pub const DEFAULT_AI_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_AI_MODEL: &str = "deepseek-chat";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP bind host
    pub http_host: String,

    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// JWT lifetime in seconds (default: 7 days)
    pub jwt_lifetime_secs: i64,

    /// Whether self-registration may create admin accounts
    pub allow_admin_signup: bool,

    /// Chat-completions API key; the assistant answers 503 without one
    #[serde(skip_serializing)]
    pub ai_api_key: Option<String>,

    /// Base URL the assistant appends `/chat/completions` to
    pub ai_base_url: String,

    pub ai_model: String,

    /// Upper bound on one completion request, in seconds
    pub ai_timeout_secs: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            http_port: parse_var("HTTP_PORT", "8080")?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./apotheca.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),

            jwt_lifetime_secs: parse_var("JWT_LIFETIME_SECS", "604800")?,

            allow_admin_signup: parse_var("ALLOW_ADMIN_SIGNUP", "false")?,

            ai_api_key: env::var("AI_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),

            ai_base_url: env::var("AI_BASE_URL").unwrap_or_else(|_| DEFAULT_AI_BASE_URL.to_string()),

            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string()),

            ai_timeout_secs: parse_var("AI_TIMEOUT_SECS", "30")?,
        };

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.ai_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("AI_TIMEOUT_SECS".to_string()));
        }

        Ok(config)
    }

    /// `true` when the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            database_path: "./apotheca.db".to_string(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 604_800,
            allow_admin_signup: false,
            ai_api_key: None,
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_timeout_secs: 30,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
