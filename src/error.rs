//! Error types for the document model
//!
//! Only structurally invalid calls produce errors. Degenerate transform
//! outcomes (a range that vanished, boundaries that crossed) are ordinary
//! values and never show up here.

use crate::model::{NodeId, OperationKind};
use thiserror::Error;

/// Errors raised by the document model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// `Range::create_from_ranges` was given no ranges.
    #[error("Cannot create a range from an empty list of ranges")]
    EmptyInput,

    #[error("Position path must not be empty")]
    EmptyPath,

    /// The path does not resolve to an element in the tree.
    #[error("Position path {path:?} does not point to a valid place in the tree")]
    InvalidPath { path: Vec<usize> },

    #[error("Unknown tree walker direction: {direction}")]
    UnknownWalkerDirection { direction: String },

    #[error("Tree walker needs either boundaries or a start position")]
    WalkerStartMissing,

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} has no parent")]
    DetachedNode(NodeId),

    #[error("Node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("Root not found: {0}")]
    RootNotFound(String),

    #[error("Root already exists: {0}")]
    DuplicateRoot(String),

    /// The operation was built against a different document version.
    #[error("Operation base version {actual:?} does not match document version {expected}")]
    VersionMismatch { expected: u64, actual: Option<u64> },

    #[error("Invalid {kind} operation: {reason}")]
    InvalidOperation {
        kind: OperationKind,
        reason: &'static str,
    },
}

impl ModelError {
    pub(crate) fn invalid(kind: OperationKind, reason: &'static str) -> Self {
        ModelError::InvalidOperation { kind, reason }
    }

    /// Check if this error was raised while validating an operation.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, ModelError::InvalidOperation { .. })
    }
}

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnknownWalkerDirection {
            direction: "sideways".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tree walker direction: sideways");

        let err = ModelError::invalid(OperationKind::Split, "split in root");
        assert_eq!(err.to_string(), "Invalid split operation: split in root");
        assert!(err.is_invalid_operation());
    }
}
