//! Scheme handlers used by [`UrlResource`](super::adapters::UrlResource).
//!
//! A handler knows how to probe and open URLs of one or more schemes.
//! Implement [`SchemeHandler`] and register it on a [`SchemeRegistry`] to
//! teach URL resources a new protocol.

use std::fmt;
use std::fs::{self, File};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use super::error::ResourceError;
use super::resource::ResourceResult;
use super::stream::ByteStream;
use crate::core::config::HttpConfig;

/// Metadata a handler reports for an existing URL target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlProbe {
    /// Content length in bytes, if the protocol reports one.
    pub content_length: Option<u64>,

    /// Last modification time, if the protocol reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Trait for per-scheme URL backends.
pub trait SchemeHandler: Send + Sync {
    /// Lower-case schemes this handler serves.
    fn schemes(&self) -> &[&'static str];

    /// Check if this handler can serve the given URL.
    fn handles(&self, url: &Url) -> bool {
        self.schemes().iter().any(|scheme| *scheme == url.scheme())
    }

    /// Query metadata without transferring content.
    ///
    /// Fails with `NotFound` when the target does not exist.
    fn probe(&self, url: &Url) -> ResourceResult<UrlProbe>;

    /// Open a fresh stream over the target's content.
    fn open(&self, url: &Url) -> ResourceResult<ByteStream>;
}

/// Ordered collection of scheme handlers; the first match wins.
#[derive(Clone)]
pub struct SchemeRegistry {
    handlers: Vec<Arc<dyn SchemeHandler>>,
}

impl SchemeRegistry {
    /// A registry without any handler.
    pub fn empty() -> Self {
        Self { handlers: Vec::new() }
    }

    /// The built-in handlers: `file`, plus `http`/`https` when compiled with
    /// the `http` feature.
    #[cfg_attr(not(feature = "http"), allow(unused_variables))]
    pub fn standard(http: &HttpConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(FileSchemeHandler));
        #[cfg(feature = "http")]
        registry.register(Arc::new(HttpSchemeHandler::new(http.clone())));
        registry
    }

    /// Append a handler. Earlier registrations take precedence.
    pub fn register(&mut self, handler: Arc<dyn SchemeHandler>) {
        self.handlers.push(handler);
    }

    /// Find the handler for `url`.
    pub fn find(&self, url: &Url) -> Option<&Arc<dyn SchemeHandler>> {
        let found = self.handlers.iter().find(|handler| handler.handles(url));
        if found.is_none() {
            debug!("No scheme handler registered for {}", url.scheme());
        }
        found
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::standard(&HttpConfig::default())
    }
}

impl fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schemes: Vec<_> = self
            .handlers
            .iter()
            .flat_map(|handler| handler.schemes().iter().copied())
            .collect();
        f.debug_struct("SchemeRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

// ============================================================================
// file: URLs
// ============================================================================

/// Serves `file:` URLs from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSchemeHandler;

impl FileSchemeHandler {
    fn path(url: &Url) -> ResourceResult<std::path::PathBuf> {
        url.to_file_path()
            .map_err(|()| ResourceError::resolution(format!("{} is not a local file URL", url)))
    }
}

impl SchemeHandler for FileSchemeHandler {
    fn schemes(&self) -> &[&'static str] {
        &["file"]
    }

    fn probe(&self, url: &Url) -> ResourceResult<UrlProbe> {
        let path = Self::path(url)?;
        let metadata = fs::metadata(&path).map_err(|e| ResourceError::from_io(e, url))?;
        Ok(UrlProbe {
            content_length: Some(metadata.len()),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    fn open(&self, url: &Url) -> ResourceResult<ByteStream> {
        let path = Self::path(url)?;
        if fs::metadata(&path).map_err(|e| ResourceError::from_io(e, url))?.is_dir() {
            return Err(ResourceError::Io(std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                format!("{} is a directory", url),
            )));
        }
        debug!("Opening {}", url);
        let file = File::open(&path).map_err(|e| ResourceError::from_io(e, url))?;
        Ok(ByteStream::new(file, format!("URL [{}]", url)))
    }
}

// ============================================================================
// http: and https: URLs
// ============================================================================

/// Serves `http:` and `https:` URLs through a blocking reqwest client.
///
/// The client is built on first use, so constructing the handler inside an
/// async context is fine as long as requests run on a blocking thread.
#[cfg(feature = "http")]
pub struct HttpSchemeHandler {
    config: HttpConfig,
    client: std::sync::OnceLock<Result<reqwest::blocking::Client, String>>,
}

#[cfg(feature = "http")]
impl HttpSchemeHandler {
    /// Create a handler using the given timeout and user agent.
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            client: std::sync::OnceLock::new(),
        }
    }

    fn client(&self) -> ResourceResult<&reqwest::blocking::Client> {
        self.client
            .get_or_init(|| {
                reqwest::blocking::Client::builder()
                    .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
                    .user_agent(self.config.user_agent.clone())
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| ResourceError::Io(std::io::Error::other(e.clone())))
    }

    fn check_status(url: &Url, status: reqwest::StatusCode) -> ResourceResult<()> {
        use reqwest::StatusCode;

        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            Err(ResourceError::not_found(url.as_str()))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ResourceError::access_denied(format!("{} answered {}", url, status)))
        } else {
            Err(ResourceError::Io(std::io::Error::other(format!(
                "{} answered {}",
                url, status
            ))))
        }
    }
}

#[cfg(feature = "http")]
impl SchemeHandler for HttpSchemeHandler {
    fn schemes(&self) -> &[&'static str] {
        &["http", "https"]
    }

    fn probe(&self, url: &Url) -> ResourceResult<UrlProbe> {
        debug!("HEAD {}", url);
        let response = self
            .client()?
            .head(url.clone())
            .send()
            .map_err(|e| ResourceError::Io(std::io::Error::other(e)))?;
        Self::check_status(url, response.status())?;

        let headers = response.headers();
        let content_length = headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let last_modified = headers
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);

        Ok(UrlProbe {
            content_length,
            last_modified,
        })
    }

    fn open(&self, url: &Url) -> ResourceResult<ByteStream> {
        debug!("GET {}", url);
        let response = self
            .client()?
            .get(url.clone())
            .send()
            .map_err(|e| ResourceError::Io(std::io::Error::other(e)))?;
        Self::check_status(url, response.status())?;
        Ok(ByteStream::new(response, format!("URL [{}]", url)))
    }
}

/// Parse an HTTP date (IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_file_handler_probe_and_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"abc").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let handler = FileSchemeHandler;
        assert!(handler.handles(&url));
        let probe = handler.probe(&url).unwrap();
        assert_eq!(probe.content_length, Some(3));
        assert!(probe.last_modified.is_some());

        let mut out = String::new();
        handler.open(&url).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_file_handler_missing_target() {
        let dir = TempDir::new().unwrap();
        let url = Url::from_file_path(dir.path().join("nope")).unwrap();
        assert!(FileSchemeHandler.probe(&url).unwrap_err().is_not_found());
        assert!(FileSchemeHandler.open(&url).unwrap_err().is_not_found());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SchemeRegistry::default();
        let file_url = Url::parse("file:///tmp/x").unwrap();
        assert!(registry.find(&file_url).is_some());

        let ftp_url = Url::parse("ftp://example.com/x").unwrap();
        assert!(registry.find(&ftp_url).is_none());
        assert!(SchemeRegistry::empty().find(&file_url).is_none());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_registry_has_http_with_feature() {
        let registry = SchemeRegistry::default();
        assert!(registry.find(&Url::parse("https://example.com/").unwrap()).is_some());
    }

    #[test]
    fn test_parse_http_date() {
        let parsed = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());
        assert!(parse_http_date("yesterday").is_none());
    }
}
