//! Error types and handling for the resource library.
//!
//! This module defines a unified error type that can represent errors from
//! the resources domain and the surrounding infrastructure, so that callers
//! embedding the loader (such as the inspector binary) have a single type to
//! propagate.

use thiserror::Error;

/// A specialized Result type for crate-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the resources domain.
    #[error("Resource error: {0}")]
    Resource(#[from] crate::domains::resources::ResourceError),

    /// Path security violations.
    #[error("Path security error: {0}")]
    Security(#[from] super::security::PathSecurityError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors while checking configured directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
