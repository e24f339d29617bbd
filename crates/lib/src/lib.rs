//!
//! Treepatch: diff and merge engines for nested data trees.
//!
//! ## Core Concepts
//!
//! * **Trees (`tree::Node`, `tree::Value`)**: Nested maps of string keys to
//!   scalar and container values, addressed by dotted key paths
//!   (`tree::KeyPath`).
//! * **Modifiers (`diff::Modifier`)**: The minimal set of field-level `set`
//!   and `unset` operations transforming one tree into another, computed by
//!   [`diff::diff`] and replayed by [`diff::apply`].
//! * **Stores (`diff::Store`)**: Caller-supplied persistence driven by
//!   [`diff::update`], the read-diff-apply-commit-verify cycle.
//! * **Merging (`merge::merge`)**: Recursive combination of a value with an
//!   operator-tagged instruction tree under one of nine set-algebra
//!   operators (`merge::Operator`).
//!
//! The engines are pure: they take trees and return trees or modifiers,
//! keep no state across calls, and never touch their inputs.

pub mod diff;
pub mod merge;
pub mod tree;

/// Re-export the core tree types for easier access.
pub use tree::{KeyPath, Node, Value};

/// Re-export the two engine entry points.
pub use diff::{Modifier, diff};
pub use merge::{Operator, merge};

/// Result type used throughout the treepatch library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the treepatch library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured tree and path errors from the tree module
    #[error(transparent)]
    Tree(tree::TreeError),

    /// Structured diff and update errors from the diff module
    #[error(transparent)]
    Diff(diff::DiffError),

    /// Structured merge errors from the merge module
    #[error(transparent)]
    Merge(merge::MergeError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Tree(_) => "tree",
            Error::Diff(_) => "diff",
            Error::Merge(_) => "merge",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates malformed input (a bad path, an
    /// unknown operator tag, or a non-list match argument).
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_path_error(),
            Error::Merge(merge_err) => merge_err.is_operator_error(),
            _ => false,
        }
    }

    /// Check if this error is a type violation (a tree type mismatch or a
    /// strict-mode merge rejection).
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_type_error(),
            Error::Merge(merge_err) => merge_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error means `update` had no baseline to diff against.
    pub fn is_no_baseline(&self) -> bool {
        matches!(self, Error::Diff(diff_err) if diff_err.is_no_baseline())
    }
}
