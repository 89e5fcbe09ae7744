//! Domain errors raised by the apple lifecycle model

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppleError {
    /// A state precondition was violated (e.g. dropping an apple twice)
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// A percent was outside (0, 100] or would push the total past 100
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// A record-level rule failed before a write
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },
}

impl AppleError {
    pub fn validation(field: &str, message: &str) -> Self {
        AppleError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub type AppleResult<T> = Result<T, AppleError>;
