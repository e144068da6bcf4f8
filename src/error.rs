//! Error types for catalog-service
//!
//! Errors are converted to appropriate HTTP responses for API clients; the
//! enhancement worker uses the same type and decides ack/no-ack from the
//! variant.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

/// Result type for catalog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed
    #[error("validation error: {0}")]
    Validation(String),

    /// Object storage operation failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Queue operation failed
    #[error("queue error: {0}")]
    Queue(String),

    /// Image transform call failed
    #[error("transform error: {0}")]
    Transform(String),

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to API clients
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Queue(_)
            | AppError::Transform(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            _ => "server_error",
        };

        HttpResponse::build(status).json(ErrorBody {
            error,
            message: self.to_string(),
            status: status.as_u16(),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("product 99".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_400() {
        let err = AppError::Validation("mrp must be positive".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn transform_maps_to_500() {
        let err = AppError::Transform("quota exceeded".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
