//! Error types for toolsession
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Required input was empty or whitespace-only; never sent to the backend
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Backend answered with a non-success status
    #[error("Request failed ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Request { status: u16, detail: Option<String> },

    /// Network failure or an undecodable response body
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SessionError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message shown to the user for this error.
    ///
    /// Request errors surface the backend `detail`; anything without a
    /// structured detail falls back to `fallback`. Validation errors keep their
    /// own message since they never reached the backend.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Request {
                detail: Some(detail), ..
            } if !detail.trim().is_empty() => detail.clone(),
            Self::Request { .. } | Self::Transport(_) => fallback.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
