//! Error handling for the orchard server
//!
//! Every error becomes a JSON body carrying a stable code and a user-facing
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::AppleError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Lifecycle errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<AppleError> for AppError {
    fn from(err: AppleError) -> Self {
        match err {
            AppleError::InvalidTransition(msg) => AppError::InvalidStateTransition(msg),
            AppleError::OutOfRange(msg) => AppError::OutOfRange(msg),
            AppleError::Validation { field, message } => AppError::Validation { field, message },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// A write lost a race against another request on the same row
    pub fn stale(resource: &str) -> Self {
        AppError::Conflict {
            resource: resource.to_string(),
            message: "was changed by another request, reload and try again".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition(_) | AppError::OutOfRange(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        match self {
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message: format!("{} not found", resource),
                field: None,
            },
            AppError::InvalidStateTransition(msg) => ErrorDetail {
                code: "INVALID_STATE_TRANSITION".to_string(),
                message: msg.clone(),
                field: None,
            },
            AppError::OutOfRange(msg) => ErrorDetail {
                code: "OUT_OF_RANGE".to_string(),
                message: msg.clone(),
                field: Some("percent".to_string()),
            },
            AppError::Conflict { resource, message } => ErrorDetail {
                code: "CONFLICT".to_string(),
                message: format!("{} {}", resource, message),
                field: None,
            },
            AppError::Validation { field, message } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message: message.clone(),
                field: Some(field.clone()),
            },
            AppError::DatabaseError(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message: "A database error occurred".to_string(),
                field: None,
            },
            AppError::Internal(msg) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: msg.clone(),
                field: None,
            },
            AppError::InternalError(_) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: "An internal server error occurred".to_string(),
                field: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_detail = self.detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
