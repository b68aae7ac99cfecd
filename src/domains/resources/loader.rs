//! Resource loader - turns location strings into resources.
//!
//! Dispatch order for [`ResourceLoader::get_resource`]:
//! 1. registered [`ProtocolResolver`]s, first hit wins
//! 2. `embedded:` / `classpath:` prefix → [`EmbeddedResource`]
//! 3. absolute URL with a multi-letter scheme that is either served by a
//!    scheme handler or carries an authority (`scheme://host/...`) →
//!    [`UrlResource`]
//! 4. anything else → [`FileResource`], relative to the base directory
//!
//! File locations (including `file:` URLs) are checked against the
//! configured security root, and the handles carry that root so relative
//! handles derived from them are checked too.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use super::adapters::{EmbeddedBundle, EmbeddedResource, FileResource, UrlResource};
use super::error::ResourceError;
use super::handlers::SchemeRegistry;
use super::resource::{Resource, ResourceResult};
use crate::core::config::{Config, SecurityConfig};
use crate::core::security::validate_path;

/// Prefix selecting the embedded bundle.
pub const EMBEDDED_PREFIX: &str = "embedded:";

/// Alias of [`EMBEDDED_PREFIX`].
pub const CLASSPATH_PREFIX: &str = "classpath:";

/// Hook for custom location syntaxes, consulted before the built-in rules.
pub trait ProtocolResolver: Send + Sync {
    /// Return a resource if this resolver understands `location`.
    fn resolve(&self, location: &str, loader: &ResourceLoader) -> Option<Box<dyn Resource>>;
}

impl<F> ProtocolResolver for F
where
    F: Fn(&str, &ResourceLoader) -> Option<Box<dyn Resource>> + Send + Sync,
{
    fn resolve(&self, location: &str, loader: &ResourceLoader) -> Option<Box<dyn Resource>> {
        self(location, loader)
    }
}

/// Creates resources from location strings.
pub struct ResourceLoader {
    base_dir: Option<PathBuf>,
    bundle: Option<EmbeddedBundle>,
    schemes: SchemeRegistry,
    security: SecurityConfig,
    resolvers: Vec<Arc<dyn ProtocolResolver>>,
}

impl ResourceLoader {
    /// Create a loader from the given configuration.
    pub fn new(config: &Config) -> Self {
        info!("Initializing ResourceLoader");

        let bundle = config.loader.embedded_root.as_ref().map(|root| {
            info!("Embedded bundle directory: {}", root.display());
            EmbeddedBundle::directory(root)
        });

        Self {
            base_dir: config.loader.base_dir.clone(),
            bundle,
            schemes: SchemeRegistry::standard(&config.http),
            security: config.security.clone(),
            resolvers: Vec::new(),
        }
    }

    /// Validate `config` first, then build the loader.
    ///
    /// Fails when a configured directory is missing or the base directory
    /// lies outside the security root.
    pub fn try_new(config: &Config) -> crate::core::Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the embedded bundle, e.g. with a packed one.
    pub fn with_bundle(mut self, bundle: EmbeddedBundle) -> Self {
        self.bundle = Some(bundle);
        self
    }

    /// Replace the scheme handlers used by URL resources.
    pub fn with_schemes(mut self, schemes: SchemeRegistry) -> Self {
        self.schemes = schemes;
        self
    }

    /// Register a resolver. Resolvers run in registration order.
    pub fn add_protocol_resolver(&mut self, resolver: impl ProtocolResolver + 'static) {
        self.resolvers.push(Arc::new(resolver));
    }

    /// The scheme handlers handed to URL resources.
    pub fn schemes(&self) -> &SchemeRegistry {
        &self.schemes
    }

    /// The directory relative file locations are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolve `location` into a resource handle.
    ///
    /// Nothing is read; the returned handle may point at absent content.
    /// Fails with `AccessDenied` when a file location is outside the
    /// security root and with `Resolution` for `embedded:` locations when no
    /// bundle is configured.
    #[instrument(skip(self))]
    pub fn get_resource(&self, location: &str) -> ResourceResult<Box<dyn Resource>> {
        for resolver in &self.resolvers {
            if let Some(resource) = resolver.resolve(location, self) {
                debug!("Resolved by protocol resolver: {}", resource.description());
                return Ok(resource);
            }
        }

        let embedded_name = location
            .strip_prefix(EMBEDDED_PREFIX)
            .or_else(|| location.strip_prefix(CLASSPATH_PREFIX));
        if let Some(name) = embedded_name {
            return self.embedded(name).map(|r| Box::new(r) as Box<dyn Resource>);
        }

        if let Ok(url) = Url::parse(location) {
            // Single letters are drive prefixes such as C:\ rather than schemes
            if url.scheme().len() > 1 && (self.schemes.find(&url).is_some() || url.has_host()) {
                return self.url(url).map(|r| Box::new(r) as Box<dyn Resource>);
            }
        }

        self.file(location).map(|r| Box::new(r) as Box<dyn Resource>)
    }

    fn embedded(&self, name: &str) -> ResourceResult<EmbeddedResource> {
        let bundle = self.bundle.clone().ok_or_else(|| {
            ResourceError::resolution(format!("no embedded bundle configured for {:?}", name))
        })?;
        debug!("Embedded location: {}", name);
        Ok(EmbeddedResource::new(name, bundle))
    }

    fn url(&self, url: Url) -> ResourceResult<UrlResource> {
        if url.scheme() == "file" {
            let path = url.to_file_path().map_err(|()| {
                ResourceError::resolution(format!("{} is not a local file URL", url))
            })?;
            validate_path(&path, &self.security)?;
        }
        debug!("URL location: {}", url);
        Ok(UrlResource::with_registry(url, self.schemes.clone()).with_security(self.security.clone()))
    }

    fn file(&self, location: &str) -> ResourceResult<FileResource> {
        let path = match &self.base_dir {
            Some(base) if Path::new(location).is_relative() => base.join(location),
            _ => PathBuf::from(location),
        };
        let mut validated = validate_path(&path, &self.security)?;
        // Canonical forms drop the trailing separator that marks a directory
        if location.ends_with('/') || location.ends_with('\\') {
            validated.push("");
        }
        debug!("File location: {}", validated.display());
        Ok(FileResource::new(validated).with_security(self.security.clone()))
    }
}

impl fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("base_dir", &self.base_dir)
            .field("bundle", &self.bundle)
            .field("schemes", &self.schemes)
            .field("security", &self.security)
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
