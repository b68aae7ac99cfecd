//! Uniform Resource Access Library
//!
//! This crate provides a single [`Resource`] abstraction over readable data
//! sources (local files, embedded bundles, URLs and in-memory buffers) plus a
//! [`ResourceLoader`] that turns location strings into the right adapter.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, and path security
//! - **domains**: Business logic organized by bounded contexts
//!   - **resources**: The resource contract, its adapters, and the loader
//!
//! # Example
//!
//! ```rust,no_run
//! use resource_access::{Config, Resource, ResourceLoader};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let loader = ResourceLoader::new(&config);
//!
//!     let settings = loader.get_resource("conf/settings.toml")?;
//!     if settings.exists() {
//!         println!("{}", settings.read_to_string()?);
//!     }
//!
//!     let sibling = settings.create_relative("defaults.toml")?;
//!     println!("{} exists: {}", sibling.description(), sibling.exists());
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use crate::core::{Config, Error, Result};
pub use domains::resources::{Resource, ResourceError, ResourceLoader};
