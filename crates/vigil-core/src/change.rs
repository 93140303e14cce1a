//! Change events dispatched by observable containers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an observable container.
///
/// Every wrapper, including each derived view of a mapping, draws a fresh id
/// when it is constructed. Changes carry the id of the container whose
/// listeners they were dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(Uuid);

impl ContainerId {
    /// Create a new random container ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One notification describing a successful mutation.
///
/// `added` and `removed` list the elements the operation was asked to add or
/// remove, in the order it saw them. For bulk operations this does not imply
/// every element was absent (or present) beforehand. A flag may be set while
/// its list is empty, e.g. when an empty mapping is cleared.
///
/// Mapping changes use the same shape with `(key, value)` pairs, see
/// [`MapChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    source: ContainerId,
    added: Vec<T>,
    removed: Vec<T>,
    was_added: bool,
    was_removed: bool,
}

/// A change to a mapping, expressed as `(key, value)` pairs.
pub type MapChange<K, V> = Change<(K, V)>;

impl<T> Change<T> {
    /// An addition-only change.
    pub fn addition(source: ContainerId, added: Vec<T>) -> Self {
        Self {
            source,
            added,
            removed: Vec::new(),
            was_added: true,
            was_removed: false,
        }
    }

    /// A removal-only change.
    pub fn removal(source: ContainerId, removed: Vec<T>) -> Self {
        Self {
            source,
            added: Vec::new(),
            removed,
            was_added: false,
            was_removed: true,
        }
    }

    /// A replacement: both flags are set.
    pub fn update(source: ContainerId, removed: Vec<T>, added: Vec<T>) -> Self {
        Self {
            source,
            added,
            removed,
            was_added: true,
            was_removed: true,
        }
    }

    /// The container this change was dispatched for.
    pub fn source(&self) -> ContainerId {
        self.source
    }

    /// Elements added by the operation.
    pub fn added(&self) -> &[T] {
        &self.added
    }

    /// Elements removed by the operation.
    pub fn removed(&self) -> &[T] {
        &self.removed
    }

    /// Whether the operation added elements.
    pub fn was_added(&self) -> bool {
        self.was_added
    }

    /// Whether the operation removed elements.
    pub fn was_removed(&self) -> bool {
        self.was_removed
    }

    /// Whether this is a replacement (both flags set).
    pub fn is_update(&self) -> bool {
        self.was_added && self.was_removed
    }

    /// Consume the change, returning `(added, removed)`.
    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        (self.added, self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_flags() {
        let id = ContainerId::new();
        let change = Change::addition(id, vec!["G"]);

        assert_eq!(change.source(), id);
        assert!(change.was_added());
        assert!(!change.was_removed());
        assert_eq!(change.added(), &["G"]);
        assert!(change.removed().is_empty());
    }

    #[test]
    fn test_removal_may_be_empty() {
        let change: Change<&str> = Change::removal(ContainerId::new(), Vec::new());
        assert!(change.was_removed());
        assert!(change.removed().is_empty());
        assert!(!change.is_update());
    }

    #[test]
    fn test_update_sets_both_flags() {
        let change = Change::update(ContainerId::new(), vec![("4", "D")], vec![("4", "DD")]);
        assert!(change.is_update());

        let (added, removed) = change.into_parts();
        assert_eq!(added, vec![("4", "DD")]);
        assert_eq!(removed, vec![("4", "D")]);
    }

    #[test]
    fn test_container_ids_are_unique() {
        assert_ne!(ContainerId::new(), ContainerId::new());
    }

    #[test]
    fn test_change_serializes() {
        let change = Change::addition(ContainerId::new(), vec!["A".to_string()]);
        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["added"][0], "A");
        assert_eq!(json["was_added"], true);
        assert_eq!(json["was_removed"], false);
    }
}
