use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplaintError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Complaint rejected: abusive content")]
    AbusiveContent,

    #[error("Submitter account is banned")]
    Banned,

    #[error("Abuse classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ComplaintError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ComplaintError::Database(_)
            | ComplaintError::Migration(_)
            | ComplaintError::Http(_)
            | ComplaintError::Io(_)
            | ComplaintError::Internal(_) => "internal",
            ComplaintError::Config(_) => "config",
            ComplaintError::InvalidInput(_) => "invalid_input",
            ComplaintError::NotFound(_) => "not_found",
            ComplaintError::Unauthorized(_) => "unauthorized",
            ComplaintError::AbusiveContent => "abusive_content",
            ComplaintError::Banned => "banned",
            ComplaintError::ClassifierUnavailable(_) => "classifier_unavailable",
            ComplaintError::InvalidTransition { .. } => "invalid_transition",
        }
    }

    /// Whether repeating the same store operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ComplaintError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            ComplaintError::Io(_) => true,
            _ => false,
        }
    }
}

impl ResponseError for ComplaintError {
    fn status_code(&self) -> StatusCode {
        match self {
            ComplaintError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ComplaintError::NotFound(_) => StatusCode::NOT_FOUND,
            ComplaintError::Unauthorized(_) | ComplaintError::Banned => StatusCode::FORBIDDEN,
            ComplaintError::AbusiveContent => StatusCode::UNPROCESSABLE_ENTITY,
            ComplaintError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ComplaintError::ClassifierUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ComplaintError::Database(_)
            | ComplaintError::Migration(_)
            | ComplaintError::Http(_)
            | ComplaintError::Io(_)
            | ComplaintError::Config(_)
            | ComplaintError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            match self {
                ComplaintError::ClassifierUnavailable(_) => {
                    "Content screening is temporarily unavailable".to_string()
                }
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}

impl From<validator::ValidationErrors> for ComplaintError {
    fn from(err: validator::ValidationErrors) -> Self {
        ComplaintError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComplaintError>;
