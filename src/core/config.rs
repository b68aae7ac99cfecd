//! Configuration management for the resource library.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::security::validate_path;

/// Main configuration structure.
///
/// Organized by concern: how locations are loaded, how remote URLs are
/// dereferenced, logging, and path security.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resource loader configuration.
    pub loader: LoaderConfig,

    /// HTTP scheme handler configuration.
    pub http: HttpConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Security and path validation configuration.
    pub security: SecurityConfig,
}

/// Configuration for the resource loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory that relative file locations are resolved against.
    /// If None, relative locations are used as given (relative to the
    /// process working directory).
    pub base_dir: Option<PathBuf>,

    /// Expanded directory backing `embedded:` / `classpath:` locations.
    pub embedded_root: Option<PathBuf>,
}

/// Configuration for dereferencing `http:` and `https:` URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Optional root directory for file locations.
    /// If None, no path restrictions are enforced.
    pub root_path: Option<PathBuf>,

    /// Whether to allow symlinks in path validation.
    /// If true, symlinks are followed and their targets are validated.
    /// If false, symlinks pointing outside the root are rejected.
    pub allow_symlinks: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            // No root path restriction by default
            root_path: None,
            // Allow symlinks by default with validation
            allow_symlinks: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `RESOURCE_`.
    /// For example: `RESOURCE_BASE_DIR`, `RESOURCE_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(level) = std::env::var("RESOURCE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(base_dir) = std::env::var("RESOURCE_BASE_DIR") {
            config.loader.base_dir = Some(PathBuf::from(base_dir));
        }

        if let Ok(embedded_root) = std::env::var("RESOURCE_EMBEDDED_ROOT") {
            config.loader.embedded_root = Some(PathBuf::from(embedded_root));
        }

        if let Ok(timeout) = std::env::var("RESOURCE_HTTP_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.http.timeout_secs = secs,
                Err(_) => warn!(
                    "Ignoring invalid RESOURCE_HTTP_TIMEOUT_SECS {:?}, using {}s",
                    timeout, config.http.timeout_secs
                ),
            }
        }

        if let Ok(user_agent) = std::env::var("RESOURCE_USER_AGENT") {
            config.http.user_agent = user_agent;
        }

        // Load security configuration
        if let Ok(root_path) = std::env::var("RESOURCE_ROOT_PATH") {
            config.security.root_path = Some(PathBuf::from(root_path));
            info!("Path security enabled: root directory set to {:?}", config.security.root_path);
        } else {
            warn!(
                "RESOURCE_ROOT_PATH not set - no path restrictions active. \
                 All filesystem locations will be allowed."
            );
        }

        if let Ok(allow_symlinks) = std::env::var("RESOURCE_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = allow_symlinks.parse().unwrap_or(true);
            info!("Symlinks allowed: {}", config.security.allow_symlinks);
        }

        config
    }

    /// Check that configured directories exist and that the base directory
    /// lies inside the security root.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_dir) = &self.loader.base_dir {
            require_directory("RESOURCE_BASE_DIR", base_dir)?;
            validate_path(base_dir, &self.security)?;
        }
        if let Some(embedded_root) = &self.loader.embedded_root {
            require_directory("RESOURCE_EMBEDDED_ROOT", embedded_root)?;
        }
        if let Some(root_path) = &self.security.root_path {
            require_directory("RESOURCE_ROOT_PATH", root_path)?;
        }
        Ok(())
    }
}

fn require_directory(setting: &str, path: &Path) -> Result<()> {
    if !fs::metadata(path)?.is_dir() {
        return Err(Error::config(format!("{} {} is not a directory", setting, path.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_loader_dirs_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("RESOURCE_BASE_DIR", "/srv/data");
            std::env::set_var("RESOURCE_EMBEDDED_ROOT", "/srv/bundle");
        }
        let config = Config::from_env();
        assert_eq!(config.loader.base_dir, Some(PathBuf::from("/srv/data")));
        assert_eq!(config.loader.embedded_root, Some(PathBuf::from("/srv/bundle")));
        unsafe {
            std::env::remove_var("RESOURCE_BASE_DIR");
            std::env::remove_var("RESOURCE_EMBEDDED_ROOT");
        }
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("RESOURCE_HTTP_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.http.timeout_secs, 30);
        unsafe {
            std::env::set_var("RESOURCE_HTTP_TIMEOUT_SECS", "5");
        }
        let config = Config::from_env();
        assert_eq!(config.http.timeout_secs, 5);
        unsafe {
            std::env::remove_var("RESOURCE_HTTP_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_security_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("RESOURCE_ROOT_PATH", "/srv");
            std::env::set_var("RESOURCE_ALLOW_SYMLINKS", "false");
        }
        let config = Config::from_env();
        assert_eq!(config.security.root_path, Some(PathBuf::from("/srv")));
        assert!(!config.security.allow_symlinks);
        unsafe {
            std::env::remove_var("RESOURCE_ROOT_PATH");
            std::env::remove_var("RESOURCE_ALLOW_SYMLINKS");
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.loader.base_dir.is_none());
        assert!(config.security.root_path.is_none());
        assert!(config.security.allow_symlinks);
        assert_eq!(config.logging.level, "info");
        assert!(config.http.user_agent.starts_with("resource_access/"));
    }

    #[test]
    fn test_validate_accepts_defaults_and_real_dirs() {
        assert!(Config::default().validate().is_ok());

        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.loader.base_dir = Some(dir.path().to_path_buf());
        config.security.root_path = Some(dir.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let mut config = Config::default();
        config.loader.embedded_root = Some(file);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.loader.base_dir = Some(dir.path().join("missing"));
        assert!(matches!(config.validate(), Err(Error::Io(_))));
    }

    #[test]
    fn test_validate_base_dir_outside_root() {
        let root = tempfile::TempDir::new().unwrap();
        let other = tempfile::TempDir::new().unwrap();

        let mut config = Config::default();
        config.loader.base_dir = Some(other.path().to_path_buf());
        config.security.root_path = Some(root.path().to_path_buf());
        assert!(matches!(config.validate(), Err(Error::Security(_))));
    }

    #[test]
    fn test_config_json_roundtrip_shape() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["http"]["timeout_secs"], 30);
        assert!(json["loader"]["base_dir"].is_null());
    }
}
