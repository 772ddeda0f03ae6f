//! Domain error types for the Sketchy server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("{0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Local login attempted before the email address was verified
    #[error("Please verify your email before logging in")]
    EmailNotVerified,

    /// Verification token unknown or past its expiry (deliberately indistinguishable)
    #[error("Invalid or expired verification token")]
    InvalidOrExpiredToken,

    /// A required collaborator is not configured
    #[error("{0}")]
    Configuration(String),

    /// Server-side fault not attributable to the request
    #[error("{0}")]
    Internal(String),

    /// An outbound collaborator (GitHub, Gemini, Resend) failed
    #[error("{0}")]
    Upstream(String),

    /// The vision model answered with something that is not the expected JSON
    #[error("Invalid AI response format")]
    InvalidModelOutput { raw: String },
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::EmailNotVerified => (StatusCode::FORBIDDEN, "EMAIL_NOT_VERIFIED"),
            AppError::InvalidOrExpiredToken => (StatusCode::BAD_REQUEST, "INVALID_OR_EXPIRED_TOKEN"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED"),
            AppError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::InvalidModelOutput { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_MODEL_OUTPUT")
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.status_and_code();

        let message = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                "An internal database error occurred".to_string()
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                self.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let raw = match self {
            AppError::InvalidModelOutput { raw } => Some(raw.clone()),
            _ => None,
        };

        let needs_verification = matches!(self, AppError::EmailNotVerified).then_some(true);

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message,
            raw,
            needs_verification,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Unmodified model output, present only for unparseable generations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Set when a login is refused until the email is verified.
    #[serde(rename = "needsVerification", skip_serializing_if = "Option::is_none")]
    pub needs_verification: Option<bool>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("Upstream request timed out: {}", err))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}
