//! Filesystem-backed resource.

use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use url::Url;

use crate::core::config::SecurityConfig;
use crate::core::security::validate_path;
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::paths::{apply_relative_path, clean_path, filename};
use crate::domains::resources::resource::{Resource, ResourceResult};
use crate::domains::resources::stream::{ByteChannel, ByteStream};

/// A resource backed by a path on the local filesystem.
///
/// The locator is kept as a cleaned, `/`-separated string; relative
/// resolution works on that string so that `"/a/b/"` and `"/a/b"` resolve
/// differently, as a directory and a file respectively. Paths that are not
/// valid UTF-8 are used verbatim on disk and cannot be resolved against.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: String,
    file: PathBuf,
    description: String,
    security: SecurityConfig,
}

impl FileResource {
    /// Create a handle for `path`. Nothing is checked on disk.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let (path, file) = match path.to_str() {
            Some(text) => {
                let cleaned = clean_path(text);
                let file = PathBuf::from(&cleaned);
                (cleaned, file)
            }
            None => (clean_path(&path.to_string_lossy()), path.to_path_buf()),
        };
        let absolute = std::path::absolute(&file).unwrap_or_else(|_| file.clone());
        Self {
            description: format!("file [{}]", absolute.display()),
            path,
            file,
            security: SecurityConfig::default(),
        }
    }

    /// Confine this handle, and every handle derived from it, to `security`.
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    /// The cleaned locator.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn metadata(&self) -> ResourceResult<fs::Metadata> {
        fs::metadata(&self.file).map_err(|e| ResourceError::from_io(e, &self.description))
    }

    /// Re-run path security; the target may have changed since the handle
    /// was created.
    fn check_location(&self) -> ResourceResult<()> {
        if self.security.root_path.is_some() {
            validate_path(&self.file, &self.security)?;
        }
        Ok(())
    }

    fn open_file(&self) -> ResourceResult<File> {
        self.check_location()?;
        if self.metadata()?.is_dir() {
            return Err(ResourceError::Io(std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                format!("{} is a directory", self.description),
            )));
        }
        debug!("Opening {}", self.description);
        File::open(&self.file).map_err(|e| ResourceError::from_io(e, &self.description))
    }
}

impl Resource for FileResource {
    fn exists(&self) -> bool {
        match fs::metadata(&self.file) {
            Ok(_) => true,
            Err(e) => {
                trace!("Existence check for {} failed: {}", self.description, e);
                false
            }
        }
    }

    /// Readable only if it is a regular file that can actually be opened.
    fn is_readable(&self) -> bool {
        match fs::metadata(&self.file) {
            Ok(metadata) if metadata.is_file() => File::open(&self.file).is_ok(),
            _ => false,
        }
    }

    fn is_file(&self) -> bool {
        true
    }

    fn url(&self) -> ResourceResult<Url> {
        let absolute = std::path::absolute(&self.file)?;
        Url::from_file_path(&absolute).map_err(|()| {
            ResourceError::resolution(format!("{} has no file: URL form", self.description))
        })
    }

    fn file(&self) -> ResourceResult<PathBuf> {
        Ok(self.file.clone())
    }

    fn open_stream(&self) -> ResourceResult<ByteStream> {
        Ok(ByteStream::new(self.open_file()?, self.description.clone()))
    }

    fn readable_channel(&self) -> ResourceResult<ByteChannel> {
        Ok(ByteChannel::from_file(self.open_file()?, self.description.clone()))
    }

    fn content_length(&self) -> ResourceResult<u64> {
        Ok(self.metadata()?.len())
    }

    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        Ok(self.metadata()?.modified()?.into())
    }

    fn create_relative(&self, relative_path: &str) -> ResourceResult<Box<dyn Resource>> {
        if self.file.to_str().is_none() {
            return Err(ResourceError::resolution(format!(
                "{} is not valid UTF-8 and cannot be resolved against",
                self.description
            )));
        }
        let joined = apply_relative_path(&self.path, relative_path);
        let relative = FileResource::new(clean_path(&joined)).with_security(self.security.clone());
        relative.check_location()?;
        Ok(Box::new(relative))
    }

    fn filename(&self) -> Option<String> {
        filename(&self.path)
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

impl PartialEq for FileResource {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.file == other.file
    }
}

impl Eq for FileResource {}

impl Hash for FileResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
