//! # Operations Assistant
//!
//! A thin client for an OpenAI-compatible chat-completions endpoint, plus
//! the store snapshot every assistant prompt is grounded on.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/ai                                                           │
//! │       │                                                                 │
//! │       ├── OperationsContext::load(db)                                   │
//! │       │     low-stock drugs, drug / sale counts, Σ price × stock        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Assistant::complete(messages)                                          │
//! │       │  POST {AI_BASE_URL}/chat/completions                            │
//! │       │  Authorization: Bearer {AI_API_KEY}                             │
//! │       ▼                                                                 │
//! │  choices[0].message.content                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use apotheca_core::{Drug, Money};
use apotheca_db::{Database, DbResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("AI assistant is not configured: set AI_API_KEY")]
    NotConfigured,

    #[error("AI service error: {0}")]
    Upstream(String),

    #[error("Failed to build AI HTTP client: {0}")]
    Client(String),
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::NotConfigured => ApiError::Unavailable(err.to_string()),
            AssistantError::Upstream(_) => ApiError::BadGateway(err.to_string()),
            AssistantError::Client(detail) => ApiError::Internal(detail),
        }
    }
}

// =============================================================================
// Chat wire types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

// =============================================================================
// Context
// =============================================================================

/// What the assistant knows about the pharmacy when it answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsContext {
    /// Active catalog size.
    pub total_drugs: i64,
    pub total_sales: i64,
    /// Active drugs at or below their threshold, emptiest first.
    pub low_stock: Vec<LowStockLine>,
    pub inventory_value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockLine {
    pub name: String,
    pub stock: i64,
}

impl From<&Drug> for LowStockLine {
    fn from(drug: &Drug) -> Self {
        LowStockLine {
            name: drug.name.clone(),
            stock: drug.stock,
        }
    }
}

impl OperationsContext {
    /// Reads the snapshot from the store.
    pub async fn load(db: &Database) -> DbResult<Self> {
        let stats = db.stats().dashboard().await?;
        let low_stock = db.drugs().low_stock().await?;
        let inventory_value_cents = db.stats().inventory_value_cents().await?;

        Ok(OperationsContext {
            total_drugs: stats.total_products,
            total_sales: stats.total_sales,
            low_stock: low_stock.iter().map(LowStockLine::from).collect(),
            inventory_value_cents,
        })
    }

    /// Plain-text block embedded in the prompts.
    pub fn summary(&self) -> String {
        let low_stock = if self.low_stock.is_empty() {
            "none".to_string()
        } else {
            self.low_stock
                .iter()
                .map(|line| format!("{} ({} left)", line.name, line.stock))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "Drugs in catalog: {}\nLow-stock drugs: {}\nSales recorded: {}\nInventory value: {}",
            self.total_drugs,
            low_stock,
            self.total_sales,
            Money::from_cents(self.inventory_value_cents)
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Chat-completions client. Built once at startup and shared.
#[derive(Debug, Clone)]
pub struct Assistant {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl Assistant {
    pub fn new(config: &ApiConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .map_err(|e| AssistantError::Client(e.to_string()))?;

        Ok(Assistant {
            http,
            endpoint: format!("{}/chat/completions", config.ai_base_url.trim_end_matches('/')),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one completion request and returns the first choice's text,
    /// or `None` when the service answered without any.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or(AssistantError::NotConfigured)?;
        debug!(messages = messages.len(), model = %self.model, "Requesting completion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Completion request rejected");
            return Err(AssistantError::Upstream(format!("upstream returned {}", status)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Upstream(e.to_string()))?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty()))
    }
}
