use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::config::SecurityConfig;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Validates that a file location is within the configured security boundaries.
///
/// This function performs the following checks:
/// 1. If no root path is configured, the path is returned unchanged
/// 2. Existing paths are canonicalized to resolve `.`, `..`, and symlinks and
///    must land inside the canonical root
/// 3. Symlinks are handled according to the configured policy
/// 4. Paths that do not exist yet are normalized lexically on top of their
///    deepest existing ancestor, so a resource handle may still be created for
///    content that appears later
///
/// # Returns
///
/// * `Ok(PathBuf)` - The validated path (canonical when it exists)
/// * `Err(PathSecurityError)` - If validation fails
///
/// # Examples
///
/// ```rust,ignore
/// let config = Config::from_env();
/// let safe_path = validate_path(Path::new("/srv/data/report.csv"), &config.security)?;
/// ```
pub fn validate_path(path: &Path, security: &SecurityConfig) -> Result<PathBuf, PathSecurityError> {
    // No restrictions configured
    let Some(root) = security.root_path.as_ref() else {
        return Ok(path.to_path_buf());
    };

    // Canonicalize the root path first
    let canonical_root = root.canonicalize().map_err(|e| PathSecurityError::IoError {
        path: root.clone(),
        error: e,
    })?;

    if !path.exists() && !path.is_symlink() {
        let resolved = resolve_missing(path)?;
        if !is_within_root(&resolved, &canonical_root) {
            return Err(PathSecurityError::OutsideRootDirectory {
                path: resolved,
                root: canonical_root,
            });
        }
        return Ok(resolved);
    }

    // Handle symlinks according to policy
    if path.is_symlink() && !security.allow_symlinks {
        return Err(PathSecurityError::SymlinkOutsideRoot {
            path: path.to_path_buf(),
        });
    }

    let canonical_path = path.canonicalize().map_err(|e| PathSecurityError::CannotCanonicalize {
        path: path.to_path_buf(),
        error: e,
    })?;

    if !is_within_root(&canonical_path, &canonical_root) {
        if path.is_symlink() {
            return Err(PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            });
        }
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

/// Checks if a path is within (or equal to) a root directory
fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Normalizes a path that does not exist: the deepest existing ancestor is
/// canonicalized and the remaining components are folded lexically on top.
fn resolve_missing(path: &Path) -> Result<PathBuf, PathSecurityError> {
    let absolute = std::path::absolute(path).map_err(|e| PathSecurityError::IoError {
        path: path.to_path_buf(),
        error: e,
    })?;
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut remainder = Vec::new();
    while !existing.exists() {
        let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
            break;
        };
        remainder.push(name.to_os_string());
        existing = parent;
    }

    let mut resolved = existing
        .canonicalize()
        .map_err(|e| PathSecurityError::CannotCanonicalize {
            path: existing.to_path_buf(),
            error: e,
        })?;
    for name in remainder.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Folds `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config(root: Option<PathBuf>, allow_symlinks: bool) -> SecurityConfig {
        SecurityConfig {
            root_path: root,
            allow_symlinks,
        }
    }

    #[test]
    fn test_no_root_allows_any_path() {
        let config = create_test_config(None, true);
        let result = validate_path(Path::new("/definitely/not/here.txt"), &config);

        assert_eq!(result.unwrap(), PathBuf::from("/definitely/not/here.txt"));
    }

    #[test]
    fn test_path_within_root() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("test.txt");
        fs::write(&test_file, "test").unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path(&test_file, &config);

        assert!(result.is_ok());
    }

    #[test]
    fn test_path_outside_root() {
        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let outside_file = outside_dir.path().join("outside.txt");
        fs::write(&outside_file, "test").unwrap();

        let config = create_test_config(Some(root_dir.path().to_path_buf()), true);
        let result = validate_path(&outside_file, &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let test_file = temp_dir.path().join("test.txt");
        fs::write(&test_file, "test").unwrap();

        // Try to access parent directory file from subdir using ../
        let config = create_test_config(Some(subdir.clone()), true);
        let traversal_path = subdir.join("../test.txt");

        let result = validate_path(&traversal_path, &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_missing_path_inside_root_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("later/created.txt");

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path(&missing, &config).unwrap();

        let canonical_root = temp_dir.path().canonicalize().unwrap();
        assert_eq!(result, canonical_root.join("later/created.txt"));
    }

    #[test]
    fn test_missing_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let config = create_test_config(Some(subdir.clone()), true);
        let result = validate_path(&subdir.join("../../escape.txt"), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");

        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path(&link_file, &config);

        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();

        let target_file = outside_dir.path().join("target.txt");
        let link_file = root_dir.path().join("link.txt");

        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let config = create_test_config(Some(root_dir.path().to_path_buf()), true);
        let result = validate_path(&link_file, &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkOutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_disallowed_by_config() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target_file = temp_dir.path().join("target.txt");
        let link_file = temp_dir.path().join("link.txt");

        fs::write(&target_file, "test").unwrap();
        symlink(&target_file, &link_file).unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), false);
        let result = validate_path(&link_file, &config);

        assert!(result.is_err());
    }
}
