//! Resources resolved against an embedded bundle.
//!
//! A bundle is either an expanded directory on disk or a packed, in-process
//! table of named blobs (typically filled with `include_bytes!`). Names are
//! `/`-separated and relative to the bundle root.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use url::Url;

use crate::domains::resources::error::ResourceError;
use crate::domains::resources::paths::{apply_relative_path, clean_path, escapes_root, filename};
use crate::domains::resources::resource::{Resource, ResourceResult};
use crate::domains::resources::stream::ByteStream;

/// The set of named entries embedded resources are resolved against.
#[derive(Clone)]
pub enum EmbeddedBundle {
    /// Entries are files below this directory.
    Directory(PathBuf),

    /// Entries live in memory.
    Packed(Arc<PackedBundle>),
}

/// In-memory bundle contents.
pub struct PackedBundle {
    entries: BTreeMap<String, Arc<[u8]>>,
    built_at: DateTime<Utc>,
}

impl EmbeddedBundle {
    /// A bundle expanded into `root`.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self::Directory(root.into())
    }

    /// A packed bundle built from `(name, bytes)` pairs.
    ///
    /// Entry names are cleaned the same way resource names are, so
    /// `"/conf/./app.toml"` is stored as `"conf/app.toml"`. The bundle's
    /// build time doubles as every entry's modification time.
    pub fn packed<I, N, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: Into<Arc<[u8]>>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, bytes)| (normalize_name(name.as_ref()), bytes.into()))
            .collect();
        Self::Packed(Arc::new(PackedBundle {
            entries,
            built_at: Utc::now(),
        }))
    }

    /// Whether the bundle is an expanded directory.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    fn same_bundle(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Directory(a), Self::Directory(b)) => a == b,
            (Self::Packed(a), Self::Packed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PackedBundle {
    /// Names of all entries, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// When the bundle was assembled.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl fmt::Debug for EmbeddedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(root) => f.debug_tuple("Directory").field(root).finish(),
            Self::Packed(packed) => f
                .debug_struct("Packed")
                .field("entries", &packed.entries.len())
                .field("built_at", &packed.built_at)
                .finish(),
        }
    }
}

/// Strip any leading `/` and fold dot segments.
fn normalize_name(name: &str) -> String {
    let cleaned = clean_path(name);
    cleaned.trim_start_matches('/').to_string()
}

/// A resource named inside an [`EmbeddedBundle`].
#[derive(Debug, Clone)]
pub struct EmbeddedResource {
    path: String,
    bundle: EmbeddedBundle,
}

impl EmbeddedResource {
    /// Create a handle for `path` inside `bundle`. Nothing is checked.
    pub fn new(path: &str, bundle: EmbeddedBundle) -> Self {
        Self {
            path: normalize_name(path),
            bundle,
        }
    }

    /// The cleaned entry name.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The bundle this resource is resolved against.
    pub fn bundle(&self) -> &EmbeddedBundle {
        &self.bundle
    }

    /// Location on disk for directory bundles. `None` when the name climbs
    /// out of the bundle root.
    fn located_file(&self, root: &std::path::Path) -> Option<PathBuf> {
        (!escapes_root(&self.path)).then(|| root.join(&self.path))
    }

    fn packed_entry<'a>(&self, packed: &'a PackedBundle) -> Option<&'a Arc<[u8]>> {
        packed.entries.get(&self.path)
    }

    fn directory_metadata(&self, root: &std::path::Path) -> ResourceResult<fs::Metadata> {
        let file = self
            .located_file(root)
            .ok_or_else(|| ResourceError::not_found(self.description()))?;
        fs::metadata(&file).map_err(|e| ResourceError::from_io(e, self.description()))
    }
}

impl Resource for EmbeddedResource {
    fn exists(&self) -> bool {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => match self.directory_metadata(root) {
                Ok(_) => true,
                Err(e) => {
                    trace!("Existence check for {} failed: {}", self.description(), e);
                    false
                }
            },
            EmbeddedBundle::Packed(packed) => self.packed_entry(packed).is_some(),
        }
    }

    fn is_readable(&self) -> bool {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => self
                .directory_metadata(root)
                .is_ok_and(|metadata| metadata.is_file()),
            EmbeddedBundle::Packed(packed) => self.packed_entry(packed).is_some(),
        }
    }

    fn is_file(&self) -> bool {
        self.bundle.is_directory()
    }

    fn url(&self) -> ResourceResult<Url> {
        let path = self.file()?;
        let absolute = std::path::absolute(&path)?;
        Url::from_file_path(&absolute).map_err(|()| {
            ResourceError::resolution(format!("{} has no file: URL form", self.description()))
        })
    }

    fn file(&self) -> ResourceResult<PathBuf> {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => self
                .located_file(root)
                .ok_or_else(|| ResourceError::resolution(format!("{} escapes its bundle", self.description()))),
            EmbeddedBundle::Packed(_) => Err(ResourceError::unsupported_locator(format!(
                "{} lives in a packed bundle",
                self.description()
            ))),
        }
    }

    fn open_stream(&self) -> ResourceResult<ByteStream> {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => {
                let metadata = self.directory_metadata(root)?;
                if metadata.is_dir() {
                    return Err(ResourceError::Io(std::io::Error::new(
                        std::io::ErrorKind::IsADirectory,
                        format!("{} is a directory", self.description()),
                    )));
                }
                let file = self
                    .located_file(root)
                    .ok_or_else(|| ResourceError::not_found(self.description()))?;
                debug!("Opening {}", self.description());
                let handle = File::open(&file).map_err(|e| ResourceError::from_io(e, self.description()))?;
                Ok(ByteStream::new(handle, self.description()))
            }
            EmbeddedBundle::Packed(packed) => {
                let bytes = self
                    .packed_entry(packed)
                    .ok_or_else(|| ResourceError::not_found(self.description()))?;
                debug!("Opening {}", self.description());
                Ok(ByteStream::new(Cursor::new(Arc::clone(bytes)), self.description()))
            }
        }
    }

    fn content_length(&self) -> ResourceResult<u64> {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => Ok(self.directory_metadata(root)?.len()),
            EmbeddedBundle::Packed(packed) => self
                .packed_entry(packed)
                .map(|bytes| bytes.len() as u64)
                .ok_or_else(|| ResourceError::not_found(self.description())),
        }
    }

    fn last_modified(&self) -> ResourceResult<DateTime<Utc>> {
        match &self.bundle {
            EmbeddedBundle::Directory(root) => Ok(self.directory_metadata(root)?.modified()?.into()),
            EmbeddedBundle::Packed(packed) => self
                .packed_entry(packed)
                .map(|_| packed.built_at)
                .ok_or_else(|| ResourceError::not_found(self.description())),
        }
    }

    fn create_relative(&self, relative_path: &str) -> ResourceResult<Box<dyn Resource>> {
        let joined = clean_path(&apply_relative_path(&self.path, relative_path));
        if escapes_root(&joined) {
            return Err(ResourceError::resolution(format!(
                "{} relative to {} escapes the bundle",
                relative_path,
                self.description()
            )));
        }
        Ok(Box::new(EmbeddedResource::new(&joined, self.bundle.clone())))
    }

    fn filename(&self) -> Option<String> {
        filename(&self.path)
    }

    fn description(&self) -> String {
        format!("embedded resource [{}]", self.path)
    }
}

impl PartialEq for EmbeddedResource {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.bundle.same_bundle(&other.bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn packed() -> EmbeddedBundle {
        EmbeddedBundle::packed([
            ("conf/app.toml", &b"name = \"demo\"\n"[..]),
            ("/conf/./logging.toml", &b"level = \"info\"\n"[..]),
            ("templates/index.html", &b"<html></html>"[..]),
        ])
    }

    #[test]
    fn test_packed_lookup_and_metadata() {
        let bundle = packed();
        let resource = EmbeddedResource::new("/conf/app.toml", bundle.clone());
        assert_eq!(resource.path(), "conf/app.toml");
        assert!(resource.exists());
        assert!(resource.is_readable());
        assert!(!resource.is_file());
        assert_eq!(resource.content_length().unwrap(), 14);
        assert_eq!(resource.read_to_string().unwrap(), "name = \"demo\"\n");

        let EmbeddedBundle::Packed(inner) = &bundle else {
            panic!("expected packed bundle");
        };
        assert_eq!(resource.last_modified().unwrap(), inner.built_at());
        assert!(inner.names().any(|n| n == "conf/logging.toml"));
    }

    #[test]
    fn test_packed_streams_share_entry() {
        let bundle = packed();
        let EmbeddedBundle::Packed(inner) = &bundle else {
            panic!("expected packed bundle");
        };
        let resource = EmbeddedResource::new("conf/app.toml", bundle.clone());

        let stream = resource.open_stream().unwrap();
        assert_eq!(Arc::strong_count(&inner.entries["conf/app.toml"]), 2);
        drop(stream);
        assert_eq!(Arc::strong_count(&inner.entries["conf/app.toml"]), 1);
    }

    #[test]
    fn test_packed_has_no_locators() {
        let resource = EmbeddedResource::new("conf/app.toml", packed());
        assert!(matches!(resource.url(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(resource.uri(), Err(ResourceError::UnsupportedLocator(_))));
        assert!(matches!(resource.file(), Err(ResourceError::UnsupportedLocator(_))));
    }

    #[test]
    fn test_packed_missing_entry() {
        let resource = EmbeddedResource::new("conf/missing.toml", packed());
        assert!(!resource.exists());
        assert!(resource.content_length().unwrap_err().is_not_found());
        assert!(resource.last_modified().unwrap_err().is_not_found());
        assert!(resource.open_stream().unwrap_err().is_not_found());
    }

    #[test]
    fn test_packed_create_relative() {
        let resource = EmbeddedResource::new("conf/app.toml", packed());
        let sibling = resource.create_relative("logging.toml").unwrap();
        assert!(sibling.exists());
        assert_eq!(sibling.description(), "embedded resource [conf/logging.toml]");

        let other = resource.create_relative("../templates/index.html").unwrap();
        assert_eq!(other.read_to_vec().unwrap(), b"<html></html>");

        assert!(matches!(
            resource.create_relative("../../outside.txt"),
            Err(ResourceError::Resolution(_))
        ));
    }

    #[test]
    fn test_directory_bundle() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/app.toml"), b"x = 1").unwrap();

        let bundle = EmbeddedBundle::directory(dir.path());
        let resource = EmbeddedResource::new("conf/app.toml", bundle.clone());
        assert!(resource.exists());
        assert!(resource.is_file());
        assert_eq!(resource.content_length().unwrap(), 5);
        assert_eq!(resource.file().unwrap(), dir.path().join("conf/app.toml"));
        assert_eq!(resource.url().unwrap().scheme(), "file");
        assert!(resource.last_modified().is_ok());

        let conf_dir = EmbeddedResource::new("conf", bundle);
        assert!(conf_dir.exists());
        assert!(!conf_dir.is_readable());
    }

    #[test]
    fn test_escaping_name_never_exists() {
        let dir = TempDir::new().unwrap();
        let resource = EmbeddedResource::new("../secret", EmbeddedBundle::directory(dir.path()));
        assert!(!resource.exists());
        assert!(resource.open_stream().unwrap_err().is_not_found());
        assert!(matches!(resource.file(), Err(ResourceError::Resolution(_))));
    }

    #[test]
    fn test_filename_and_equality() {
        let bundle = packed();
        let a = EmbeddedResource::new("conf/app.toml", bundle.clone());
        let b = EmbeddedResource::new("/conf/app.toml", bundle);
        assert_eq!(a, b);
        assert_ne!(a, EmbeddedResource::new("conf/app.toml", packed()));
        assert_eq!(a.filename().as_deref(), Some("app.toml"));
    }
}
