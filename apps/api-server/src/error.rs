//! Error types for the API server.
//!
//! ## Status Mapping
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Unauthorized` | 401 |
//! | `PermissionDenied` | 403 |
//! | `NotFound` | 404 |
//! | `InvalidArgument` | 400 |
//! | `Conflict` | 409 |
//! | `InsufficientStock` | 409 |
//! | `BadGateway` | 502, the AI service failed |
//! | `Unavailable` | 503, the AI service is not configured |
//! | `Internal` | 500, detail logged but never sent |

use apotheca_core::{CoreError, ValidationError};
use apotheca_db::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::response::ApiResponse;

/// API errors, one variant per category the client can observe.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Same message for unknown users and wrong passwords.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid username or password".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) | ApiError::InsufficientStock(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                error!(target: "internal", error = %detail, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::DrugNotFound(_) | CoreError::SaleNotFound(_) | CoreError::UserNotFound(_) => {
                ApiError::NotFound(message)
            }
            CoreError::InsufficientStock { .. } => ApiError::InsufficientStock(message),
            CoreError::AdminRequired { .. } | CoreError::DrugLocked { .. } => {
                ApiError::PermissionDenied(message)
            }
            CoreError::InvalidTransition { .. } => ApiError::Conflict(message),
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } => {
                ApiError::InvalidArgument(message)
            }
            CoreError::Validation(inner) => ApiError::from(inner),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Duplicate { .. } => ApiError::Conflict(err.to_string()),
            other => ApiError::InvalidArgument(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::from(core),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
