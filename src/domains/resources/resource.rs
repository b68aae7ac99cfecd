//! The [`Resource`] contract.
//!
//! A resource is a handle on a readable data source that abstracts over the
//! backing store: a file, an embedded bundle entry, a URL or a byte buffer.
//! Handles are immutable; only the backing store changes between calls, so
//! `exists`, `content_length` and `last_modified` re-query it every time.
//!
//! Every method may block on I/O. Async callers should go through
//! [`offload`](super::offload).

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::error::ResourceError;
use super::stream::{ByteChannel, ByteStream};

/// Result type for resource operations.
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Uniform handle on a readable data source.
///
/// Only [`exists`](Resource::exists), [`open_stream`](Resource::open_stream)
/// and [`description`](Resource::description) have no usable default; the
/// remaining methods default to the behaviour of a resource without a URL,
/// file or relative-resolution concept.
pub trait Resource: fmt::Debug + Send + Sync {
    /// Whether the backing store currently holds content this handle can open.
    ///
    /// Never fails: any backing-store error is reported as `false`, so this is
    /// safe to call speculatively. "Absent" and "could not check" are not
    /// distinguished.
    fn exists(&self) -> bool;

    /// Whether the content can be read. Defaults to [`exists`](Resource::exists).
    fn is_readable(&self) -> bool {
        self.exists()
    }

    /// Whether this handle wraps an already-open stream that can be read at
    /// most once.
    fn is_open(&self) -> bool {
        false
    }

    /// Whether this handle is backed directly by a local filesystem path.
    fn is_file(&self) -> bool {
        false
    }

    /// The locator as a URL.
    fn url(&self) -> ResourceResult<Url> {
        Err(ResourceError::unsupported_locator(format!(
            "{} cannot be resolved to a URL",
            self.description()
        )))
    }

    /// The locator as an RFC 3986 URI string. Derived from [`url`](Resource::url).
    fn uri(&self) -> ResourceResult<String> {
        self.url().map(String::from)
    }

    /// The locator as a local filesystem path.
    fn file(&self) -> ResourceResult<PathBuf> {
        Err(ResourceError::unsupported_locator(format!(
            "{} cannot be resolved to a file path",
            self.description()
        )))
    }

    /// Open a fresh stream over the current content. The caller owns it.
    fn open_stream(&self) -> ResourceResult<ByteStream>;

    /// Open a readable channel. Defaults to wrapping [`open_stream`](Resource::open_stream).
    fn readable_channel(&self) -> ResourceResult<ByteChannel> {
        Ok(ByteChannel::from_stream(self.open_stream()?))
    }

    /// Current content length in bytes.
    ///
    /// The default reads the whole stream, so adapters that know the length
    /// cheaply override it.
    fn content_length(&self) -> ResourceResult<u64> {
        let mut stream = self.open_stream()?;
        Ok(io::copy(&mut stream, &mut io::sink())?)
    }

    /// Time the content was last modified.
    ///
    /// The default consults the filesystem through [`file`](Resource::file).
    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        let path = self.file()?;
        let metadata = fs::metadata(&path).map_err(|e| ResourceError::from_io(e, self.description()))?;
        Ok(metadata.modified()?.into())
    }

    /// A handle of the same kind whose locator is `relative_path` resolved
    /// against this handle's location.
    fn create_relative(&self, relative_path: &str) -> ResourceResult<Box<dyn Resource>> {
        Err(ResourceError::resolution(format!(
            "cannot create a resource relative to {} ({})",
            self.description(),
            relative_path
        )))
    }

    /// Last path segment of the locator, if the backing store has paths.
    fn filename(&self) -> Option<String> {
        None
    }

    /// Human-readable identifier for diagnostics. Stable for a given handle.
    fn description(&self) -> String;

    /// Read the whole content into memory.
    fn read_to_vec(&self) -> ResourceResult<Vec<u8>> {
        let mut stream = self.open_stream()?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read the whole content as UTF-8 text.
    fn read_to_string(&self) -> ResourceResult<String> {
        let bytes = self.read_to_vec()?;
        String::from_utf8(bytes).map_err(|e| {
            ResourceError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not valid UTF-8: {}", self.description(), e),
            ))
        })
    }
}

/// Point-in-time view of a resource, for diagnostics and tooling.
///
/// Fields whose query failed are `None`; nothing here is reused by the
/// resource itself.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    /// The resource description.
    pub description: String,

    /// Last path segment, if any.
    pub filename: Option<String>,

    /// Result of `exists()`.
    pub exists: bool,

    /// Result of `is_readable()`.
    pub readable: bool,

    /// Result of `is_file()`.
    pub is_file: bool,

    /// Result of `is_open()`.
    pub is_open: bool,

    /// The URL form of the locator, if it has one.
    pub url: Option<String>,

    /// The content length in bytes, if it could be determined.
    pub content_length: Option<u64>,

    /// When the content was last modified, if known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ResourceSnapshot {
    /// Query every metadata accessor of `resource` once.
    ///
    /// Single-use resources are never opened; their length is only reported
    /// when declared up front.
    pub fn capture(resource: &dyn Resource) -> Self {
        let exists = resource.exists();
        Self {
            description: resource.description(),
            filename: resource.filename(),
            exists,
            readable: resource.is_readable(),
            is_file: resource.is_file(),
            is_open: resource.is_open(),
            url: resource.url().ok().map(String::from),
            content_length: exists.then(|| resource.content_length().ok()).flatten(),
            last_modified: exists.then(|| resource.last_modified().ok()).flatten(),
        }
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> crate::core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
