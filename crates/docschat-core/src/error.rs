//! Error types for the docschat crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the docschat workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum DocsChatError {
    /// A candidate file was rejected before any network call
    #[error("Validation failed for '{name}': {reason}")]
    Validation { name: String, reason: String },

    /// The backend gateway returned a non-success status
    #[error("Gateway error ({status}): {detail}")]
    Gateway { status: u16, detail: String },

    /// The backend gateway could not be reached at all
    #[error("Transport error: {0}")]
    Transport(String),

    /// A gateway call did not resolve within the configured deadline
    #[error("Gateway request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// An operation addressed a document index that does not exist
    #[error("No document at index {index} (have {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocsChatError {
    /// Creates a Validation error
    pub fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Gateway error
    pub fn gateway(status: u16, detail: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            detail: detail.into(),
        }
    }

    /// Creates an IndexOutOfBounds error
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the gateway boundary.
    ///
    /// Returns true for `Gateway`, `Transport`, and `Timeout` errors,
    /// which the orchestrator treats identically: the in-flight operation
    /// failed and state degrades to a prior-consistent or placeholder
    /// value.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            Self::Gateway { .. } | Self::Transport(_) | Self::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for DocsChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for DocsChatError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, DocsChatError>`.
pub type Result<T> = std::result::Result<T, DocsChatError>;
