//! Error types for observable containers.
//!
//! Every failing operation is rejected before a [`Change`](crate::Change) is
//! built, so a caller that sees an error also knows no listener was invoked.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The derived view of a mapping that rejected a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// The live key set.
    Keys,
    /// The live value collection.
    Values,
    /// The live entry set.
    Entries,
}

impl ViewKind {
    /// Suffix appended to the owning mapping's label.
    pub fn suffix(&self) -> &'static str {
        match self {
            ViewKind::Keys => "keys",
            ViewKind::Values => "values",
            ViewKind::Entries => "entries",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The mutating operation that was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Single-element addition.
    Add,
    /// Single-element removal.
    Remove,
    /// Bulk addition.
    AddAll,
    /// Bulk removal.
    RemoveAll,
    /// Bulk retention against a membership list.
    RetainAll,
    /// Predicate-driven retention.
    Retain,
    /// Removal of every element.
    Clear,
    /// Removal of the element last yielded by a cursor.
    CursorRemove,
}

impl MutationKind {
    /// Get the operation name.
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::Add => "add",
            MutationKind::Remove => "remove",
            MutationKind::AddAll => "add_all",
            MutationKind::RemoveAll => "remove_all",
            MutationKind::RetainAll => "retain_all",
            MutationKind::Retain => "retain",
            MutationKind::Clear => "clear",
            MutationKind::CursorRemove => "cursor_remove",
        }
    }

    /// Whether the operation can only grow the container.
    pub fn is_addition(&self) -> bool {
        matches!(self, MutationKind::Add | MutationKind::AddAll)
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by observable containers.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A call was made in a state that does not permit it.
    #[error("Precondition violated: {message}")]
    PreconditionViolation {
        /// What was expected.
        message: String,
    },

    /// A derived view of a mapping does not support this mutation.
    #[error("Unsupported mutation on {view} view: {mutation}")]
    UnsupportedDerivedMutation {
        /// The view that rejected the call.
        view: ViewKind,
        /// The rejected operation.
        mutation: MutationKind,
    },

    /// The wrapped container failed on its own.
    #[error("Delegate operation failed: {0}")]
    Delegate(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CollectionError {
    /// Create a precondition violation.
    pub fn precondition(message: impl Into<String>) -> Self {
        CollectionError::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Create an unsupported derived mutation error.
    pub fn unsupported(view: ViewKind, mutation: MutationKind) -> Self {
        CollectionError::UnsupportedDerivedMutation { view, mutation }
    }

    /// Wrap an error raised by the delegate.
    pub fn delegate<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CollectionError::Delegate(Box::new(error))
    }

    /// Check if this is a derived view rejection.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CollectionError::UnsupportedDerivedMutation { .. })
    }

    /// Check if the delegate itself failed.
    pub fn is_delegate(&self) -> bool {
        matches!(self, CollectionError::Delegate(_))
    }
}

/// Result type for observable container operations.
pub type CollectionResult<T> = std::result::Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message() {
        let err = CollectionError::unsupported(ViewKind::Values, MutationKind::Remove);
        assert_eq!(err.to_string(), "Unsupported mutation on values view: remove");
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_delegate_keeps_source() {
        use std::error::Error;

        let cell = std::cell::RefCell::new(0);
        let _guard = cell.borrow();
        let borrow_err = cell.try_borrow_mut().unwrap_err();

        let err = CollectionError::delegate(borrow_err);
        assert!(err.source().is_some());
        assert!(err.is_delegate());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_mutation_kind_addition() {
        assert!(MutationKind::Add.is_addition());
        assert!(MutationKind::AddAll.is_addition());
        assert!(!MutationKind::Clear.is_addition());
        assert!(!MutationKind::CursorRemove.is_addition());
    }
}
