//! In-memory resources: a repeatable byte buffer and a single-use stream.

use std::fmt;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domains::resources::error::ResourceError;
use crate::domains::resources::resource::{Resource, ResourceResult};
use crate::domains::resources::stream::ByteStream;

/// A resource over a fixed byte buffer.
///
/// Always exists, can be opened any number of times, and has no locator:
/// URL, URI and file conversions fail, as does relative resolution.
#[derive(Debug, Clone)]
pub struct ByteArrayResource {
    bytes: Arc<[u8]>,
    description: String,
    created_at: DateTime<Utc>,
}

impl ByteArrayResource {
    /// Wrap `bytes`, described as "resource loaded from byte array".
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::with_description(bytes, "resource loaded from byte array")
    }

    /// Wrap `bytes` with a caller-chosen description.
    pub fn with_description(bytes: impl Into<Arc<[u8]>>, description: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// The wrapped bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Resource for ByteArrayResource {
    fn exists(&self) -> bool {
        true
    }

    fn open_stream(&self) -> ResourceResult<ByteStream> {
        Ok(ByteStream::new(
            Cursor::new(Arc::clone(&self.bytes)),
            self.description(),
        ))
    }

    fn content_length(&self) -> ResourceResult<u64> {
        Ok(self.bytes.len() as u64)
    }

    /// The buffer never changes, so this is the construction time.
    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        Ok(self.created_at)
    }

    fn read_to_vec(&self) -> ResourceResult<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }

    fn description(&self) -> String {
        format!("byte array resource [{}]", self.description)
    }
}

impl PartialEq for ByteArrayResource {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteArrayResource {}

/// A resource over an already-open reader that can be handed out once.
///
/// `is_open()` is always true. The first `open_stream()` transfers the reader
/// to the caller; every later call fails with `AlreadyConsumed`.
pub struct StreamResource {
    reader: Mutex<Option<Box<dyn Read + Send>>>,
    description: String,
    declared_length: Option<u64>,
    created_at: DateTime<Utc>,
}

impl StreamResource {
    /// Wrap `reader`, described as "resource loaded through stream".
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self::with_description(reader, "resource loaded through stream")
    }

    /// Wrap `reader` with a caller-chosen description.
    pub fn with_description(reader: impl Read + Send + 'static, description: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            description: description.into(),
            declared_length: None,
            created_at: Utc::now(),
        }
    }

    /// Declare the number of bytes the reader will produce, so that
    /// `content_length()` can answer without consuming it.
    pub fn with_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }

    /// Whether the stream has been handed out.
    pub fn is_consumed(&self) -> bool {
        self.reader.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl Resource for StreamResource {
    fn exists(&self) -> bool {
        true
    }

    fn is_open(&self) -> bool {
        true
    }

    fn open_stream(&self) -> ResourceResult<ByteStream> {
        let taken = self
            .reader
            .lock()
            .map_err(|_| ResourceError::Io(std::io::Error::other("stream resource lock poisoned")))?
            .take();
        match taken {
            Some(reader) => {
                debug!("Handing out {}", self.description());
                Ok(ByteStream::from_boxed(reader, self.description()))
            }
            None => Err(ResourceError::already_consumed(format!(
                "{}: the underlying stream can only be read once; \
                 use a repeatable resource such as a byte array if it must be read more than once",
                self.description()
            ))),
        }
    }

    /// Only the declared length is reported; measuring would consume the stream.
    fn content_length(&self) -> ResourceResult<u64> {
        self.declared_length.ok_or_else(|| {
            ResourceError::unsupported_operation(format!(
                "{} has no declared length",
                self.description()
            ))
        })
    }

    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        Ok(self.created_at)
    }

    fn description(&self) -> String {
        format!("stream resource [{}]", self.description)
    }
}

impl fmt::Debug for StreamResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResource")
            .field("description", &self.description)
            .field("consumed", &self.is_consumed())
            .field("declared_length", &self.declared_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_array_contract() {
        let resource = ByteArrayResource::new(vec![1u8, 2, 3]);
        assert!(resource.exists());
        assert!(resource.is_readable());
        assert!(!resource.is_open());
        assert!(!resource.is_file());
        assert_eq!(resource.content_length().unwrap(), 3);
        assert!(matches!(resource.url(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(resource.uri(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(resource.file(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(
            resource.create_relative("anything"),
            Err(ResourceError::Resolution(_))
        ));
        assert_eq!(resource.filename(), None);
    }

    #[test]
    fn test_byte_array_streams_are_independent() {
        let resource = ByteArrayResource::new(&b"payload"[..]);
        let mut first = resource.open_stream().unwrap();
        let mut second = resource.open_stream().unwrap();

        let mut head = [0u8; 3];
        first.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"pay");

        let mut all = Vec::new();
        second.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"payload");
        assert_eq!(resource.read_to_vec().unwrap(), b"payload");
    }

    #[test]
    fn test_byte_array_description_and_equality() {
        let a = ByteArrayResource::with_description(vec![1u8], "config blob");
        assert_eq!(a.description(), "byte array resource [config blob]");
        assert_eq!(a.description(), a.description());
        assert_eq!(a, ByteArrayResource::new(vec![1u8]));
        assert_eq!(a.last_modified().unwrap(), a.last_modified().unwrap());
    }

    #[test]
    fn test_stream_resource_single_use() {
        let resource = StreamResource::new(Cursor::new(b"once".to_vec()));
        assert!(resource.is_open());
        assert!(resource.exists());
        assert!(!resource.is_consumed());

        let mut out = String::new();
        resource.open_stream().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "once");
        assert!(resource.is_consumed());

        assert!(matches!(
            resource.open_stream(),
            Err(ResourceError::AlreadyConsumed(_))
        ));
    }

    #[test]
    fn test_stream_resource_length_is_declared_only() {
        let unknown = StreamResource::new(Cursor::new(vec![0u8; 4]));
        assert!(matches!(unknown.content_length(), Err(ResourceError::Io(_))));
        assert!(!unknown.is_consumed());

        let known = StreamResource::new(Cursor::new(vec![0u8; 4])).with_length(4);
        assert_eq!(known.content_length().unwrap(), 4);
    }

    #[test]
    fn test_stream_resource_has_no_locators() {
        let resource = StreamResource::with_description(std::io::empty(), "stdin");
        assert_eq!(resource.description(), "stream resource [stdin]");
        assert!(matches!(resource.url(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(
            resource.create_relative("x"),
            Err(ResourceError::Resolution(_))
        ));
    }

    #[test]
    fn test_stream_resource_concurrent_open_hands_out_once() {
        let resource = Arc::new(StreamResource::new(Cursor::new(vec![7u8; 16])));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resource = Arc::clone(&resource);
                std::thread::spawn(move || resource.open_stream().is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}
