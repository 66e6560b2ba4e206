use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_BODY_TOO_LARGE, ERR_INVALID_CREDENTIALS, ERR_INVALID_JSON, ERR_PATH_NOT_ALLOWED,
};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Control API bridge is misconfigured: {0}")]
    ControlApiMisconfigured(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid JSON payload")]
    InvalidJson,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("Path not allowed")]
    PathNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists")]
    AlreadyExists,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Control API error: {0}")]
    ControlApi(String),
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Configuration(ref detail) => {
                tracing::error!("Configuration error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Service is misconfigured.")
            }
            AppError::ControlApiMisconfigured(ref detail) => {
                tracing::error!("Control API misconfiguration: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Control API bridge is misconfigured.",
                )
            }
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::InvalidJson => (StatusCode::BAD_REQUEST, ERR_INVALID_JSON),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, ERR_BODY_TOO_LARGE),
            AppError::OriginNotAllowed => (StatusCode::FORBIDDEN, "Origin not allowed."),
            AppError::PathNotAllowed => (StatusCode::NOT_FOUND, ERR_PATH_NOT_ALLOWED),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, ERR_INVALID_CREDENTIALS),
            AppError::AlreadyExists => (StatusCode::CONFLICT, "Email already exists."),
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts. Please try again shortly.",
            ),
            AppError::Upstream(ref detail) => {
                tracing::error!("Upstream request failed: {}", detail);
                (StatusCode::BAD_GATEWAY, "Upstream request failed.")
            }
            AppError::ControlApi(ref detail) => {
                tracing::error!("Control API request failed: {}", detail);
                (StatusCode::BAD_GATEWAY, "Control API request failed.")
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
