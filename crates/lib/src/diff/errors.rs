//! Error types for the diff engine.

use thiserror::Error;

/// Structured error types for diff and update operations.
///
/// Missing paths, absent values, and empty containers are normal outcomes
/// expressed through the modifier, never errors. These variants cover the
/// genuinely fatal cases.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DiffError {
    /// `update` could not obtain a baseline tree to diff against.
    #[error("no previous tree available to diff against")]
    NoBaseline,

    /// The committed tree did not match the desired tree after applying
    /// the computed modifier. The diff/apply pair disagree; this is an
    /// internal-consistency bug, not a transient fault.
    #[error("tree mismatch after applying computed modifier")]
    VerificationFailed,
}

impl DiffError {
    /// Check if this error indicates a missing baseline.
    pub fn is_no_baseline(&self) -> bool {
        matches!(self, DiffError::NoBaseline)
    }

    /// Check if this error is a post-commit verification failure.
    pub fn is_verification_error(&self) -> bool {
        matches!(self, DiffError::VerificationFailed)
    }
}

impl From<DiffError> for crate::Error {
    fn from(err: DiffError) -> Self {
        crate::Error::Diff(err)
    }
}
