//! Resources domain module.
//!
//! A resource is a uniform handle on readable data, whatever stores it.
//! Callers obtain one from a [`ResourceLoader`] or an adapter constructor and
//! use the [`Resource`] contract without caring about the backing store.
//!
//! ## Architecture
//!
//! - `resource.rs` - the `Resource` trait and its default behaviour
//! - `adapters/` - one file per backing store (file, embedded, URL, memory)
//! - `handlers.rs` - per-scheme backends for URL resources
//! - `loader.rs` - location string → resource dispatch
//! - `paths.rs` - path cleaning and relative resolution
//! - `stream.rs` - caller-owned streams and channels
//! - `offload.rs` - async wrappers over the blocking contract
//!
//! ## Adding a New Backing Store
//!
//! 1. Create a new file in `adapters/` (e.g., `s3.rs`)
//! 2. Implement the `Resource` trait
//! 3. Export it in `adapters/mod.rs`
//! 4. Optionally hook it into the loader with a `ProtocolResolver`
//!
//! For a new URL scheme, implement `SchemeHandler` instead and register it on
//! the loader's `SchemeRegistry`.

pub mod adapters;
mod error;
pub mod handlers;
mod loader;
pub mod offload;
pub mod paths;
mod resource;
mod stream;

pub use adapters::{
    ByteArrayResource, EmbeddedBundle, EmbeddedResource, FileResource, PackedBundle,
    StreamResource, UrlResource,
};
pub use error::ResourceError;
pub use handlers::{FileSchemeHandler, SchemeHandler, SchemeRegistry, UrlProbe};
#[cfg(feature = "http")]
pub use handlers::HttpSchemeHandler;
pub use loader::{CLASSPATH_PREFIX, EMBEDDED_PREFIX, ProtocolResolver, ResourceLoader};
pub use resource::{Resource, ResourceResult, ResourceSnapshot};
pub use stream::{ByteChannel, ByteStream};
