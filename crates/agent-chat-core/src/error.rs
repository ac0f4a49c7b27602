//! Gateway error type.

use thiserror::Error;

/// The three failure classes a caller needs to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, HTTP status, credential or configuration failure.
    Transport,
    /// The response did not have the expected shape.
    Protocol,
    /// The referenced session no longer exists.
    NotFound,
}

/// Failure of a remote agent call.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Credential error: {0}")]
    Credentials(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transport(_)
            | Self::Status { .. }
            | Self::Credentials(_)
            | Self::Config(_) => ErrorKind::Transport,
        }
    }

    /// Build an error from a non-success HTTP status.
    ///
    /// 404 is reported as `NotFound`.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            Self::NotFound(message)
        } else {
            Self::Status { status, message }
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Protocol(error.to_string())
    }
}
