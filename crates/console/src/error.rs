//! Unified error handling for the console data layer.
//!
//! Resource services and the auth service never swallow errors: they return
//! an [`ApiError`] and leave the decision to the query cache or the caller.
//! The type is `Clone` so every caller attached to one coalesced request
//! receives the same failure.

use thiserror::Error;

use crate::storage::StorageError;

/// Message shown when the server did not provide one.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred";

/// Errors produced by the transport, services, and cache.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Login rejected by the server.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// 401 on an authenticated request; the stored session was cleared.
    #[error("Unauthorized: session is no longer valid")]
    Unauthorized,

    /// 403, authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 4xx carrying field-level detail for the form layer.
    #[error("Validation error: {message}")]
    Validation {
        /// Server-provided message.
        message: String,
        /// Field-level detail, passed through verbatim.
        details: Option<serde_json::Value>,
    },

    /// Transport-level failure, no response received.
    #[error("Network error: {0}")]
    Network(String),

    /// 5xx from the server.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The session could not be persisted locally.
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// The server-provided message, if the server sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        let message = match self {
            Self::InvalidCredentials(m) | Self::Forbidden(m) | Self::NotFound(m) => m,
            Self::Validation { message, .. } | Self::Server { message, .. } => message,
            Self::Unauthorized | Self::Network(_) | Self::Decode(_) | Self::Storage(_) => {
                return None;
            }
        };
        (!message.is_empty()).then_some(message.as_str())
    }

    /// Text suitable for a user-facing notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Network(_) => "Unable to reach the server".to_string(),
            _ => self
                .server_message()
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
        }
    }

    /// Whether a read that failed this way is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Validation {
            message: "Title is required".to_string(),
            details: None,
        };
        assert_eq!(err.user_message(), "Title is required");

        let err = ApiError::Server {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("reset".to_string()).is_retryable());
        assert!(
            ApiError::Server {
                status: 503,
                message: "busy".to_string()
            }
            .is_retryable()
        );
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::NotFound("artwork".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ApiError::NotFound("artwork aw-1".to_string()).to_string(),
            "Not found: artwork aw-1"
        );
    }
}
