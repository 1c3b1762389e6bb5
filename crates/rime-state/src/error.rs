//! Error types for typed access to a state tree.
//!
//! The engine itself never fails: unknown descriptors are no-ops and missing
//! paths read as `Undefined`. Errors only arise when a typed lens has to turn
//! a node into a Rust value (or back).

use crate::Path;
use thiserror::Error;

/// Result type alias for typed state access.
pub type RimeResult<T> = Result<T, RimeError>;

/// Errors raised by typed lens reads and writes.
#[derive(Debug, Error)]
pub enum RimeError {
    /// Path does not exist in the tree.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that was not found.
        path: Path,
    },

    /// The node has a different shape than the lens expects.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected type.
        expected: &'static str,
        /// The actual type found.
        found: &'static str,
    },

    /// Conversion between a node and a Rust value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RimeError {
    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        RimeError::PathNotFound { path }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        RimeError::TypeMismatch {
            path,
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn test_error_display() {
        let err = RimeError::path_not_found(path!("users", 0, "name"));
        assert_eq!(err.to_string(), "path not found: $.users[0].name");

        let err = RimeError::type_mismatch(path!("tags"), "array", "string");
        assert_eq!(
            err.to_string(),
            "type mismatch at $.tags: expected array, found string"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err: RimeError = serde_json::from_str::<u8>("\"x\"").unwrap_err().into();
        assert!(matches!(err, RimeError::Serialization(_)));
    }
}
