//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Goldfish
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GoldfishError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Missing credential or a 401/403-class rejection from an upstream API.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success response from a primary upstream listing call.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Failure fetching auxiliary detail for a single item. Callers degrade
    /// to defaults instead of propagating it.
    #[error("Partial item error: {0}")]
    PartialItem(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GoldfishError {
    /// Build an upstream error from a status code and message.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Whether the error means the credential itself was rejected.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type alias for Goldfish operations
pub type Result<T> = std::result::Result<T, GoldfishError>;
