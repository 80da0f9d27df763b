//! Error types for slotkit

use thiserror::Error;

/// Result type alias for slotkit operations
pub type SlotResult<T> = Result<T, SlotError>;

/// Main error type for slotkit
///
/// Errors are `Clone` because the same failure is both recorded in the
/// observable slot state and handed back to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    /// The wrapped operation failed
    #[error("Operation failed: {0}")]
    Operation(String),

    /// A stream could not be opened, or the transport failed mid-read
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A chunk transform rejected its input
    #[error("Transform error: {0}")]
    Transform(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Deadline layered on top of an operation elapsed
    #[error("Timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// The invocation was cancelled before it finished
    #[error("Invocation was cancelled")]
    Cancelled,

    /// A newer invocation replaced this one
    #[error("Invocation was superseded by a newer one")]
    Superseded,

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl SlotError {
    /// Create a new operation error
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }

    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a new HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new transform error
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new timeout error
    pub const fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    /// Whether this error marks a cancelled or superseded invocation rather
    /// than a real failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Superseded)
    }
}

impl From<anyhow::Error> for SlotError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for SlotError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for SlotError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<reqwest::Error> for SlotError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            Self::http(status.as_u16(), error.to_string())
        } else {
            Self::Connection(error.to_string())
        }
    }
}

impl From<String> for SlotError {
    fn from(message: String) -> Self {
        Self::Operation(message)
    }
}

impl From<&str> for SlotError {
    fn from(message: &str) -> Self {
        Self::Operation(message.to_string())
    }
}
