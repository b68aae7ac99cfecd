//! Resource-specific error types.

use std::io;

use thiserror::Error;

/// Errors that can occur during resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The backing content is absent at the time of the request.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Access to the resource was denied.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The requested locator form cannot be represented by this resource.
    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),

    /// A relative path or URL could not be resolved.
    #[error("Cannot resolve: {0}")]
    Resolution(String),

    /// A single-use stream has already been handed out.
    #[error("Stream already consumed: {0}")]
    AlreadyConsumed(String),

    /// An I/O error occurred while accessing the resource.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResourceError {
    /// Create a new "not found" error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new "access denied" error.
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    /// Create a new "unsupported locator" error.
    pub fn unsupported_locator(msg: impl Into<String>) -> Self {
        Self::UnsupportedLocator(msg.into())
    }

    /// Create a new "resolution" error.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a new "already consumed" error.
    pub fn already_consumed(what: impl Into<String>) -> Self {
        Self::AlreadyConsumed(what.into())
    }

    /// Create an I/O error of kind `Unsupported` for operations a backing
    /// store cannot perform.
    pub fn unsupported_operation(msg: impl Into<String>) -> Self {
        Self::Io(io::Error::new(io::ErrorKind::Unsupported, msg.into()))
    }

    /// Classify an I/O error raised while touching `what`.
    ///
    /// `NotFound` and `PermissionDenied` map onto their dedicated variants,
    /// anything else is kept as `Io`.
    pub fn from_io(error: io::Error, what: impl std::fmt::Display) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(format!("{}: {}", what, error)),
            _ => Self::Io(error),
        }
    }

    /// Whether this error reports absent content.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<crate::core::security::PathSecurityError> for ResourceError {
    fn from(error: crate::core::security::PathSecurityError) -> Self {
        Self::AccessDenied(error.to_string())
    }
}
