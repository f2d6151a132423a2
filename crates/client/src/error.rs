//! Error types for the QuizDeck client.
//!
//! Everything user-facing funnels through `AuthError`; callers display the
//! message as-is. Probe rejections (401/403) never appear here, they are
//! handled inside token validation as a forced logout.

use thiserror::Error;

/// Client-level errors surfaced to callers.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend refused a login, registration, or profile request.
    /// Carries the server's own message when one was provided, otherwise
    /// the HTTP status line.
    #[error("{reason}")]
    Rejected { reason: String },

    /// Login response carried no usable token.
    #[error("missing token")]
    MissingToken,

    /// A guarded operation was attempted without an active session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A guarded operation requires the teacher role.
    #[error("insufficient role")]
    InsufficientRole,

    /// Transport-level failure: the request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the declared shape.
    #[error("malformed server response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Session persistence failed.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Rejection with the server's message or status line.
    pub fn rejected(reason: impl Into<String>) -> Self {
        AuthError::Rejected {
            reason: reason.into(),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
