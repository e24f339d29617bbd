//! Error types for the merge engine.

use thiserror::Error;

/// Structured error types for merge operations.
///
/// Everything listed here is fatal and non-retried: a malformed
/// instruction or a strict-mode violation, never a transient condition.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// A tagged key selected an operator that does not exist.
    #[error("unknown merge operator '{tag}'")]
    UnknownOperator { tag: char },

    /// Strict-type mode rejected an assignment that would change a
    /// value's structural category.
    #[error("implicit type change in {current} {operator} {instruction}: {value}")]
    TypeConversion {
        operator: char,
        current: String,
        instruction: String,
        value: String,
    },

    /// `=` tried to replace a list with something that is neither a list
    /// nor a tagged instruction.
    #[error("replacing list value with non-list value under '{operator}'")]
    ListReplacedWithScalar { operator: char },

    /// A membership helper was handed a non-list match argument.
    #[error("{operation} takes a list to match")]
    NotAList { operation: &'static str },

    /// `construct` was called on an instruction that is not a
    /// constructor (not every top-level key is tagged).
    #[error("instruction is not a constructor")]
    NotAConstructor,
}

impl MergeError {
    /// Check if this error is an unknown operator tag.
    pub fn is_operator_error(&self) -> bool {
        matches!(self, MergeError::UnknownOperator { .. })
    }

    /// Check if this error is a strict-mode type violation.
    pub fn is_type_error(&self) -> bool {
        matches!(self, MergeError::TypeConversion { .. })
    }
}

impl From<MergeError> for crate::Error {
    fn from(err: MergeError) -> Self {
        crate::Error::Merge(err)
    }
}
