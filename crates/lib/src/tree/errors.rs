//! Error types for tree operations.
//!
//! Structured errors for path addressing and typed access over [`Node`]
//! trees. Missing paths and absent values are normal outcomes expressed
//! through `Option`, never errors.
//!
//! [`Node`]: super::Node

use thiserror::Error;

/// Structured error types for tree operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TreeError {
    /// A path was empty or otherwise unusable for the requested operation.
    #[error("invalid key path: {path}")]
    InvalidPath { path: String },

    /// A typed accessor found a value of a different shape.
    #[error("tree type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },
}

impl TreeError {
    /// Check if this error is path-related.
    pub fn is_path_error(&self) -> bool {
        matches!(self, TreeError::InvalidPath { .. })
    }

    /// Check if this error is a type mismatch.
    pub fn is_type_error(&self) -> bool {
        matches!(self, TreeError::TypeMismatch { .. })
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
