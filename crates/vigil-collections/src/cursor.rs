//! Removing iteration over an observable collection.

use std::vec;

use vigil_core::{CollectionError, CollectionResult};

use crate::bridge::{Bridge, Direct};
use crate::collection::ObservableCollection;
use crate::delegate::Collection;

/// Iterator that can remove the element it yielded last.
///
/// The cursor holds the wrapper exclusively, so the only mutations that can
/// happen while it is alive are its own removals. Each removal dispatches a
/// separate single-element change, exactly as if `remove` had been called on
/// the wrapper.
pub struct Cursor<'c, D: Collection, B = Direct> {
    owner: &'c mut ObservableCollection<D, B>,
    pending: vec::IntoIter<D::Item>,
    // Live position just past the last yielded element.
    position: usize,
    last: Option<D::Item>,
}

impl<'c, D: Collection, B: Bridge<D>> Cursor<'c, D, B> {
    pub(crate) fn new(owner: &'c mut ObservableCollection<D, B>) -> Self {
        let pending = owner.get_ref().snapshot().into_iter();
        Self {
            owner,
            pending,
            position: 0,
            last: None,
        }
    }

    /// Remove the element returned by the previous call to `next`.
    ///
    /// Fails with [`CollectionError::PreconditionViolation`] if `next` has not
    /// been called, or if this element was already removed.
    pub fn remove(&mut self) -> CollectionResult<()> {
        let Some(item) = self.last.as_ref() else {
            return Err(CollectionError::precondition(
                "cursor remove() requires a preceding next()",
            ));
        };

        if !self.owner.remove_yielded(self.position - 1, item)? {
            return Err(CollectionError::precondition(
                "element yielded by the cursor is no longer present",
            ));
        }

        self.last = None;
        self.position -= 1;
        Ok(())
    }
}

impl<D: Collection, B: Bridge<D>> Iterator for Cursor<'_, D, B> {
    type Item = D::Item;

    fn next(&mut self) -> Option<D::Item> {
        let item = self.pending.next()?;
        self.position += 1;
        self.last = Some(item.clone());
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recorder;
    use std::collections::BTreeSet;

    #[test]
    fn test_remove_before_next_fails() {
        let mut list = ObservableCollection::new(vec!["A", "B"]);
        let mut cursor = list.cursor();

        let err = cursor.remove().unwrap_err();
        assert!(matches!(err, CollectionError::PreconditionViolation { .. }));
    }

    #[test]
    fn test_double_remove_fails() {
        let mut list = ObservableCollection::new(vec!["A", "B"]);
        let mut cursor = list.cursor();

        assert_eq!(cursor.next(), Some("A"));
        cursor.remove().unwrap();
        assert!(cursor.remove().is_err());
        drop(cursor);

        assert_eq!(*list, vec!["B"]);
    }

    #[test]
    fn test_remove_every_element() {
        let mut list = ObservableCollection::new(vec!["A", "B", "C", "D", "E", "F"]);
        let (log, listener) = recorder();
        list.subscribe(listener);

        let mut cursor = list.cursor();
        while cursor.next().is_some() {
            cursor.remove().unwrap();
        }
        drop(cursor);

        assert!(list.is_empty());
        let log = log.borrow();
        assert_eq!(log.len(), 6);
        for (change, expected) in log.iter().zip(["A", "B", "C", "D", "E", "F"]) {
            assert!(change.was_removed());
            assert_eq!(change.removed(), &[expected]);
        }
    }

    #[test]
    fn test_remove_duplicates_at_position() {
        let mut list = ObservableCollection::new(vec!["A", "B", "A"]);
        let mut cursor = list.cursor();

        cursor.next();
        cursor.next();
        cursor.next();
        cursor.remove().unwrap();
        drop(cursor);

        assert_eq!(*list, vec!["A", "B"]);
    }

    #[test]
    fn test_set_cursor_removes_selected() {
        let mut set = ObservableCollection::new(BTreeSet::from([1, 2, 3, 4]));
        let (log, listener) = recorder();
        set.subscribe(listener);

        let mut cursor = set.cursor();
        while let Some(n) = cursor.next() {
            if n % 2 == 1 {
                cursor.remove().unwrap();
            }
        }
        drop(cursor);

        assert_eq!(set.snapshot(), vec![2, 4]);
        assert_eq!(log.borrow().len(), 2);
    }
}
