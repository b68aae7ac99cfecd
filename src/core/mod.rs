//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks used by the
//! resources domain: error handling, configuration and path security.

pub mod config;
pub mod error;
pub mod security;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{validate_path, PathSecurityError};
