//! Concrete resource adapters.
//!
//! Each adapter binds the [`Resource`](super::Resource) contract to one
//! backing store:
//! - `file.rs` - local filesystem paths
//! - `embedded.rs` - entries of an expanded or packed bundle
//! - `url.rs` - URLs, served by scheme handlers
//! - `memory.rs` - byte buffers and single-use streams

mod embedded;
mod file;
mod memory;
mod url;

pub use embedded::{EmbeddedBundle, EmbeddedResource, PackedBundle};
pub use file::FileResource;
pub use memory::{ByteArrayResource, StreamResource};
pub use self::url::UrlResource;
