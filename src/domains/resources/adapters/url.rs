//! URL-backed resource.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::trace;
use url::Url;

use crate::core::config::SecurityConfig;
use crate::core::security::validate_path;
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::handlers::{SchemeHandler, SchemeRegistry};
use crate::domains::resources::resource::{Resource, ResourceResult};
use crate::domains::resources::stream::ByteStream;

/// A resource identified by a URL and served by the scheme handler
/// registered for its scheme.
///
/// `file:` URLs are confined to the security root the handle carries, both
/// when opened and when relative handles are derived.
#[derive(Debug, Clone)]
pub struct UrlResource {
    url: Url,
    registry: SchemeRegistry,
    security: SecurityConfig,
}

impl UrlResource {
    /// Create a handle for `url` using the standard scheme handlers.
    pub fn new(url: Url) -> Self {
        Self::with_registry(url, SchemeRegistry::default())
    }

    /// Create a handle for `url` served by `registry`.
    pub fn with_registry(url: Url, registry: SchemeRegistry) -> Self {
        Self {
            url,
            registry,
            security: SecurityConfig::default(),
        }
    }

    /// Confine `file:` URLs reached through this handle to `security`.
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    /// Parse `location` as an absolute URL.
    pub fn parse(location: &str) -> ResourceResult<Self> {
        let url = Url::parse(location)
            .map_err(|e| ResourceError::resolution(format!("invalid URL {:?}: {}", location, e)))?;
        Ok(Self::new(url))
    }

    /// The locator.
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    fn handler(&self) -> ResourceResult<&Arc<dyn SchemeHandler>> {
        self.registry.find(&self.url).ok_or_else(|| {
            ResourceError::unsupported_operation(format!(
                "no handler for scheme {:?} of {}",
                self.url.scheme(),
                self.description()
            ))
        })
    }

    /// Handler for metadata queries. Content behind a scheme nobody serves
    /// is reported as absent.
    fn metadata_handler(&self) -> ResourceResult<&Arc<dyn SchemeHandler>> {
        self.registry.find(&self.url).ok_or_else(|| {
            ResourceError::not_found(format!(
                "{} (no handler for scheme {:?})",
                self.description(),
                self.url.scheme()
            ))
        })
    }

    /// Reject `file:` URLs outside the security root.
    fn check_location(url: &Url, security: &SecurityConfig) -> ResourceResult<()> {
        if url.scheme() != "file" || security.root_path.is_none() {
            return Ok(());
        }
        let path = url
            .to_file_path()
            .map_err(|()| ResourceError::resolution(format!("{} is not a local file URL", url)))?;
        validate_path(&path, security)?;
        Ok(())
    }
}

impl Resource for UrlResource {
    fn exists(&self) -> bool {
        match self.handler().and_then(|handler| handler.probe(&self.url)) {
            Ok(_) => true,
            Err(e) => {
                trace!("Existence check for {} failed: {}", self.description(), e);
                false
            }
        }
    }

    fn is_readable(&self) -> bool {
        if self.is_file() {
            return self
                .file()
                .is_ok_and(|path| path.is_file() && std::fs::File::open(path).is_ok());
        }
        self.exists()
    }

    fn is_file(&self) -> bool {
        self.url.scheme() == "file"
    }

    fn url(&self) -> ResourceResult<Url> {
        Ok(self.url.clone())
    }

    fn uri(&self) -> ResourceResult<String> {
        Ok(self.url.as_str().to_string())
    }

    fn file(&self) -> ResourceResult<PathBuf> {
        if !self.is_file() {
            return Err(ResourceError::resolution(format!(
                "{} cannot be resolved to a file path because it does not use the file: scheme",
                self.description()
            )));
        }
        self.url.to_file_path().map_err(|()| {
            ResourceError::resolution(format!("{} is not a local file URL", self.description()))
        })
    }

    /// Fails with `Io(Unsupported)` when no handler serves the scheme.
    fn open_stream(&self) -> ResourceResult<ByteStream> {
        let handler = self.handler()?;
        Self::check_location(&self.url, &self.security)?;
        handler.open(&self.url)
    }

    fn content_length(&self) -> ResourceResult<u64> {
        let handler = self.metadata_handler()?;
        match handler.probe(&self.url)?.content_length {
            Some(length) => Ok(length),
            // Protocol gave no length: count the bytes
            None => {
                let mut stream = handler.open(&self.url)?;
                Ok(std::io::copy(&mut stream, &mut std::io::sink())?)
            }
        }
    }

    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        self.metadata_handler()?
            .probe(&self.url)?
            .last_modified
            .ok_or_else(|| {
                ResourceError::unsupported_operation(format!(
                    "{} does not report a modification time",
                    self.description()
                ))
            })
    }

    /// RFC 3986 reference resolution. A leading `/` on `relative_path` is
    /// ignored so the result stays below this URL.
    fn create_relative(&self, relative_path: &str) -> ResourceResult<Box<dyn Resource>> {
        let relative = relative_path.strip_prefix('/').unwrap_or(relative_path);
        let url = self.url.join(relative).map_err(|e| {
            ResourceError::resolution(format!(
                "cannot resolve {:?} against {}: {}",
                relative_path,
                self.description(),
                e
            ))
        })?;
        Self::check_location(&url, &self.security)?;
        Ok(Box::new(
            UrlResource::with_registry(url, self.registry.clone()).with_security(self.security.clone()),
        ))
    }

    fn filename(&self) -> Option<String> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }

    fn description(&self) -> String {
        format!("URL [{}]", self.url)
    }
}

impl PartialEq for UrlResource {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for UrlResource {}
