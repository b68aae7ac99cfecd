// Security module for path validation and access control
//
// This module provides utilities to ensure that file-backed resources are
// restricted to a configured safe directory, preventing path traversal
// through relative locations such as `../../etc/passwd`.

pub mod path_validator;

pub use path_validator::{validate_path, PathSecurityError};
