//! Unified error types for the DetailHub API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and persistence errors
//! - `DeliveryError`: Outbound email / WhatsApp delivery errors
//! - `FilterError`: Realtime row filter parse errors
//! - `AppError`: Application layer errors (wraps the others for HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from the outbound messaging adapters (email API, WhatsApp Cloud API)
///
/// These never reach HTTP callers: dispatch logs and swallows them.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Rate limited")]
    RateLimited,
}

/// Realtime filter parse errors
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Filter must look like column=op.value, got '{0}'")]
    Malformed(String),

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid list value for 'in' filter: {0}")]
    InvalidList(String),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()))
            }
            AppError::Domain(DomainError::AlreadyExists(msg)) => {
                (StatusCode::CONFLICT, "Already exists", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "Conflict", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Delivery(e) => {
                tracing::error!("Delivery error: {}", e);
                (StatusCode::BAD_GATEWAY, "Messaging service error", None)
            }
            AppError::Filter(e) => (
                StatusCode::BAD_REQUEST,
                "Invalid filter",
                Some(e.to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
