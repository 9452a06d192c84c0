//! Error types for Posterr
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Rule violations (`SelfFollow`, `DailyLimitExceeded`, `NotFound`,
/// `InvalidPayload`) are ordinary values returned to the caller. Store and
/// internal failures end the current operation and are surfaced unchanged.
#[derive(Debug, Error)]
pub enum AppError {
    /// Actor and target of a follow are the same user (400)
    #[error("You cannot follow yourself.")]
    SelfFollow,

    /// Posting limit reached for the rolling 24h window (400)
    #[error("You have reached the limit of {limit} posts per day.")]
    DailyLimitExceeded { limit: u32 },

    /// Referenced user or post does not exist (404)
    #[error("{0} not found.")]
    NotFound(&'static str),

    /// Structurally invalid input (422)
    #[error("{0}")]
    InvalidPayload(String),

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short label used for the error metric
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::SelfFollow => "self_follow",
            AppError::DailyLimitExceeded { .. } => "daily_limit_exceeded",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidPayload(_) => "invalid_payload",
            AppError::Unauthorized => "unauthorized",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and a `{"message": ...}` JSON body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, message) = match &self {
            AppError::SelfFollow | AppError::DailyLimitExceeded { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidPayload(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Database(error) => {
                tracing::error!(%error, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!(message = %msg, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(error) => {
                tracing::error!(%error, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        let body = Json(serde_json::json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
