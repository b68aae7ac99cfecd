//! Byte streams and channels handed out by resources.
//!
//! A [`ByteStream`] is owned exclusively by whoever opened it and is released
//! when dropped. A [`ByteChannel`] adds explicit `close()` and, when backed by
//! a file, random access.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

/// A freshly opened, caller-owned byte stream.
pub struct ByteStream {
    reader: Box<dyn Read + Send>,
    origin: String,
}

impl ByteStream {
    /// Wrap a reader opened for the resource described by `origin`.
    pub fn new(reader: impl Read + Send + 'static, origin: impl Into<String>) -> Self {
        Self {
            reader: Box::new(reader),
            origin: origin.into(),
        }
    }

    /// Wrap an already boxed reader.
    pub fn from_boxed(reader: Box<dyn Read + Send>, origin: impl Into<String>) -> Self {
        Self {
            reader,
            origin: origin.into(),
        }
    }

    /// Description of the resource this stream was opened from.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Drop for ByteStream {
    fn drop(&mut self) {
        trace!("Released stream for {}", self.origin);
    }
}

enum ChannelSource {
    Stream(ByteStream),
    File(File),
}

/// A readable channel over a resource's content.
///
/// Reads after [`close`](ByteChannel::close) fail. File-backed channels also
/// report their size and support seeking.
pub struct ByteChannel {
    source: Option<ChannelSource>,
    origin: String,
}

impl ByteChannel {
    /// Channel that reads sequentially from an opened stream.
    pub fn from_stream(stream: ByteStream) -> Self {
        let origin = stream.origin().to_string();
        Self {
            source: Some(ChannelSource::Stream(stream)),
            origin,
        }
    }

    /// Channel over an open file handle.
    pub fn from_file(file: File, origin: impl Into<String>) -> Self {
        Self {
            source: Some(ChannelSource::File(file)),
            origin: origin.into(),
        }
    }

    /// Whether the channel is still open.
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Close the channel, releasing the underlying handle. Idempotent.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            trace!("Closed channel for {}", self.origin);
        }
    }

    /// Whether this channel supports [`size`](Self::size) and seeking.
    pub fn is_seekable(&self) -> bool {
        matches!(self.source, Some(ChannelSource::File(_)))
    }

    /// Current size of the underlying content, for file-backed channels.
    pub fn size(&self) -> io::Result<Option<u64>> {
        match &self.source {
            Some(ChannelSource::File(file)) => Ok(Some(file.metadata()?.len())),
            Some(ChannelSource::Stream(_)) => Ok(None),
            None => Err(closed()),
        }
    }

    /// Description of the resource this channel was opened from.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Read for ByteChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Some(ChannelSource::Stream(stream)) => stream.read(buf),
            Some(ChannelSource::File(file)) => file.read(buf),
            None => Err(closed()),
        }
    }
}

impl Seek for ByteChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.source {
            Some(ChannelSource::File(file)) => file.seek(pos),
            Some(ChannelSource::Stream(_)) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stream-backed channel is not seekable",
            )),
            None => Err(closed()),
        }
    }
}

impl fmt::Debug for ByteChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteChannel")
            .field("origin", &self.origin)
            .field("open", &self.is_open())
            .field("seekable", &self.is_seekable())
            .finish()
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "channel is closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_stream_reads_and_reports_origin() {
        let mut stream = ByteStream::new(Cursor::new(b"abc".to_vec()), "byte array resource [t]");
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
        assert_eq!(stream.origin(), "byte array resource [t]");
    }

    #[test]
    fn test_channel_close_rejects_reads() {
        let stream = ByteStream::new(Cursor::new(vec![1, 2, 3]), "t");
        let mut channel = ByteChannel::from_stream(stream);
        assert!(channel.is_open());
        assert!(!channel.is_seekable());
        assert_eq!(channel.size().unwrap(), None);

        let mut buf = [0u8; 2];
        assert_eq!(channel.read(&mut buf).unwrap(), 2);

        channel.close();
        channel.close();
        assert!(!channel.is_open());
        assert_eq!(
            channel.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_file_channel_is_seekable() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"hello world").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut channel = ByteChannel::from_file(file, "file [tmp]");
        assert!(channel.is_seekable());
        assert_eq!(channel.size().unwrap(), Some(11));

        channel.seek(SeekFrom::Start(6)).unwrap();
        let mut out = String::new();
        channel.read_to_string(&mut out).unwrap();
        assert_eq!(out, "world");
    }

    #[test]
    fn test_stream_channel_seek_unsupported() {
        let mut channel = ByteChannel::from_stream(ByteStream::new(Cursor::new(vec![0]), "t"));
        assert_eq!(
            channel.seek(SeekFrom::Start(0)).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
    }
}
