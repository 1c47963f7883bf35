//! Structured error types with stable machine-readable codes
//! Every API failure maps to one JSON shape so clients can branch on `code`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error response for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error types with proper categorization
#[derive(Debug)]
pub enum AppError {
    // Validation errors (400)
    InvalidInput { field: String, reason: String },
    EmailAlreadyRegistered(String),
    ListAlreadyShared { list_id: String, email: String },
    InvalidVerificationCode,
    VerificationCodeExpired,
    NoRecipients,

    // Authentication errors (401)
    NotAuthenticated,
    InvalidCredentials,

    // Verification pending (403)
    EmailNotVerified,

    // Not found errors (404). List/item lookups double as permission
    // failures so foreign resources are indistinguishable from missing ones.
    ListNotFound(String),
    ItemNotFound(String),
    UserNotFound(String),
    NotificationNotFound(String),

    // Internal errors (500)
    StorageError(String),
    SerializationError(String),

    // Service errors (503)
    ServiceUnavailable(String),

    // Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl AppError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::EmailAlreadyRegistered(_) => "EMAIL_ALREADY_REGISTERED",
            Self::ListAlreadyShared { .. } => "LIST_ALREADY_SHARED",
            Self::InvalidVerificationCode => "INVALID_VERIFICATION_CODE",
            Self::VerificationCodeExpired => "VERIFICATION_CODE_EXPIRED",
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::ListNotFound(_) => "LIST_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. }
            | Self::EmailAlreadyRegistered(_)
            | Self::ListAlreadyShared { .. }
            | Self::InvalidVerificationCode
            | Self::VerificationCodeExpired
            | Self::NoRecipients => StatusCode::BAD_REQUEST,

            Self::NotAuthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::EmailNotVerified => StatusCode::FORBIDDEN,

            Self::ListNotFound(_)
            | Self::ItemNotFound(_)
            | Self::UserNotFound(_)
            | Self::NotificationNotFound(_) => StatusCode::NOT_FOUND,

            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            Self::StorageError(_) | Self::SerializationError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::EmailAlreadyRegistered(email) => {
                format!("Email already registered: {email}")
            }
            Self::ListAlreadyShared { email, .. } => {
                format!("List already shared with {email}")
            }
            Self::InvalidVerificationCode => "Invalid verification code".to_string(),
            Self::VerificationCodeExpired => "Verification code expired".to_string(),
            Self::NoRecipients => "No recipients found for this list".to_string(),
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::EmailNotVerified => {
                "Email not verified. Check your inbox for the verification code.".to_string()
            }
            Self::ListNotFound(id) => {
                format!("List not found or insufficient permissions: {id}")
            }
            Self::ItemNotFound(id) => format!("Item not found: {id}"),
            Self::UserNotFound(who) => format!("User not found: {who}"),
            Self::NotificationNotFound(id) => format!("Notification not found: {id}"),
            Self::StorageError(msg) => format!("Storage error: {msg}"),
            Self::SerializationError(msg) => format!("Serialization error: {msg}"),
            Self::ServiceUnavailable(msg) => format!("Service unavailable: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to structured error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.message(),
            details: None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

/// Convert from anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Axum IntoResponse implementation for proper HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| AppError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(
            AppError::ListNotFound("123".to_string()).code(),
            "LIST_NOT_FOUND"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidInput {
                field: "name".to_string(),
                reason: "empty".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::EmailNotVerified.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::ListNotFound("123".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::StorageError("failed".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let err = AppError::EmailAlreadyRegistered("a@b.it".to_string());
        let response = err.to_response();

        assert_eq!(response.code, "EMAIL_ALREADY_REGISTERED");
        assert!(response.message.contains("a@b.it"));
    }
}
