//! Containers an observable wrapper can delegate to.
//!
//! [`Collection`] is the storage seam: the wrapper decides what to dispatch,
//! the delegate only stores. It is implemented for the std sequences and sets,
//! for `&mut C` (wrap a container you keep owning) and for `Rc<RefCell<C>>`
//! (wrap a container that is also reachable elsewhere).
//!
//! The read methods (`size`, `has`, `snapshot`) avoid the inherent std names,
//! so `len()` or `contains()` through a wrapper's `Deref` still reach the
//! delegate's own API.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;

use vigil_core::{CollectionError, CollectionResult};

/// A mutable container of elements.
pub trait Collection {
    /// Element type.
    type Item: Clone + PartialEq;

    /// Number of elements.
    fn size(&self) -> usize;

    /// Whether `item` is present.
    fn has(&self, item: &Self::Item) -> bool;

    /// The current elements, in iteration order.
    fn snapshot(&self) -> Vec<Self::Item>;

    /// Like [`snapshot`](Collection::snapshot), but reports a delegate that
    /// cannot be read right now instead of panicking. Mutations that read
    /// before writing go through this.
    fn try_snapshot(&self) -> CollectionResult<Vec<Self::Item>> {
        Ok(self.snapshot())
    }

    /// Add one element. Returns whether the container changed.
    fn add(&mut self, item: Self::Item) -> CollectionResult<bool>;

    /// Remove one occurrence of `item`. Returns whether the container changed.
    fn remove(&mut self, item: &Self::Item) -> CollectionResult<bool>;

    /// Remove the element at iteration position `index`, which must equal
    /// `expected`.
    ///
    /// Unordered containers ignore the position and remove by value.
    fn remove_at(&mut self, index: usize, expected: &Self::Item) -> CollectionResult<bool> {
        let _ = index;
        self.remove(expected)
    }

    /// Add every element of `items`.
    fn add_all(&mut self, items: &[Self::Item]) -> CollectionResult<bool> {
        let mut changed = false;
        for item in items {
            changed |= self.add(item.clone())?;
        }
        Ok(changed)
    }

    /// Remove every occurrence of every element of `items`.
    fn remove_all(&mut self, items: &[Self::Item]) -> CollectionResult<bool> {
        let mut changed = false;
        for item in items {
            while self.remove(item)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Remove every element not contained in `items`.
    fn retain_all(&mut self, items: &[Self::Item]) -> CollectionResult<bool> {
        let mut changed = false;
        for item in self.try_snapshot()? {
            if !items.contains(&item) {
                changed |= self.remove(&item)?;
            }
        }
        Ok(changed)
    }

    /// Remove every element.
    fn clear(&mut self) -> CollectionResult<()>;
}

/// A [`Collection`] without duplicate elements.
///
/// Adding a present element reports no change, so a set wrapper never
/// dispatches for it.
pub trait SetCollection: Collection {}

impl<T: Clone + PartialEq> Collection for Vec<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }

    fn snapshot(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    fn add(&mut self, item: T) -> CollectionResult<bool> {
        self.push(item);
        Ok(true)
    }

    fn remove(&mut self, item: &T) -> CollectionResult<bool> {
        match self.iter().position(|existing| existing == item) {
            Some(index) => {
                Vec::remove(self, index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_at(&mut self, index: usize, expected: &T) -> CollectionResult<bool> {
        if self.get(index) != Some(expected) {
            return Ok(false);
        }
        Vec::remove(self, index);
        Ok(true)
    }

    fn remove_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| !items.contains(existing));
        Ok(self.len() != before)
    }

    fn retain_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| items.contains(existing));
        Ok(self.len() != before)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        Vec::clear(self);
        Ok(())
    }
}

impl<T: Clone + PartialEq> Collection for VecDeque<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }

    fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn add(&mut self, item: T) -> CollectionResult<bool> {
        self.push_back(item);
        Ok(true)
    }

    fn remove(&mut self, item: &T) -> CollectionResult<bool> {
        match self.iter().position(|existing| existing == item) {
            Some(index) => Ok(VecDeque::remove(self, index).is_some()),
            None => Ok(false),
        }
    }

    fn remove_at(&mut self, index: usize, expected: &T) -> CollectionResult<bool> {
        if self.get(index) != Some(expected) {
            return Ok(false);
        }
        Ok(VecDeque::remove(self, index).is_some())
    }

    fn remove_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| !items.contains(existing));
        Ok(self.len() != before)
    }

    fn retain_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| items.contains(existing));
        Ok(self.len() != before)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        VecDeque::clear(self);
        Ok(())
    }
}

impl<T: Eq + Hash + Clone> Collection for HashSet<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }

    fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn add(&mut self, item: T) -> CollectionResult<bool> {
        Ok(self.insert(item))
    }

    fn remove(&mut self, item: &T) -> CollectionResult<bool> {
        Ok(HashSet::remove(self, item))
    }

    fn remove_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        for item in items {
            HashSet::remove(self, item);
        }
        Ok(self.len() != before)
    }

    fn retain_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| items.contains(existing));
        Ok(self.len() != before)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        HashSet::clear(self);
        Ok(())
    }
}

impl<T: Eq + Hash + Clone> SetCollection for HashSet<T> {}

impl<T: Ord + Clone> Collection for BTreeSet<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }

    fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    fn add(&mut self, item: T) -> CollectionResult<bool> {
        Ok(self.insert(item))
    }

    fn remove(&mut self, item: &T) -> CollectionResult<bool> {
        Ok(BTreeSet::remove(self, item))
    }

    fn remove_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        for item in items {
            BTreeSet::remove(self, item);
        }
        Ok(self.len() != before)
    }

    fn retain_all(&mut self, items: &[T]) -> CollectionResult<bool> {
        let before = self.len();
        self.retain(|existing| items.contains(existing));
        Ok(self.len() != before)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        BTreeSet::clear(self);
        Ok(())
    }
}

impl<T: Ord + Clone> SetCollection for BTreeSet<T> {}

impl<C: Collection + ?Sized> Collection for &mut C {
    type Item = C::Item;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn has(&self, item: &C::Item) -> bool {
        (**self).has(item)
    }

    fn snapshot(&self) -> Vec<C::Item> {
        (**self).snapshot()
    }

    fn try_snapshot(&self) -> CollectionResult<Vec<C::Item>> {
        (**self).try_snapshot()
    }

    fn add(&mut self, item: C::Item) -> CollectionResult<bool> {
        (**self).add(item)
    }

    fn remove(&mut self, item: &C::Item) -> CollectionResult<bool> {
        (**self).remove(item)
    }

    fn remove_at(&mut self, index: usize, expected: &C::Item) -> CollectionResult<bool> {
        (**self).remove_at(index, expected)
    }

    fn add_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        (**self).add_all(items)
    }

    fn remove_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        (**self).remove_all(items)
    }

    fn retain_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        (**self).retain_all(items)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        (**self).clear()
    }
}

impl<S: SetCollection + ?Sized> SetCollection for &mut S {}

/// Shared delegates. Plain reads panic if the cell is mutably borrowed
/// elsewhere, like any `RefCell` read. `try_snapshot` and every write report
/// the conflict as [`CollectionError::Delegate`].
impl<C: Collection> Collection for Rc<RefCell<C>> {
    type Item = C::Item;

    fn size(&self) -> usize {
        (**self).borrow().size()
    }

    fn has(&self, item: &C::Item) -> bool {
        (**self).borrow().has(item)
    }

    fn snapshot(&self) -> Vec<C::Item> {
        (**self).borrow().snapshot()
    }

    fn try_snapshot(&self) -> CollectionResult<Vec<C::Item>> {
        self.try_borrow()
            .map_err(CollectionError::delegate)?
            .try_snapshot()
    }

    fn add(&mut self, item: C::Item) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .add(item)
    }

    fn remove(&mut self, item: &C::Item) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .remove(item)
    }

    fn remove_at(&mut self, index: usize, expected: &C::Item) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .remove_at(index, expected)
    }

    fn add_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .add_all(items)
    }

    fn remove_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .remove_all(items)
    }

    fn retain_all(&mut self, items: &[C::Item]) -> CollectionResult<bool> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .retain_all(items)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .clear()
    }
}

impl<S: SetCollection> SetCollection for Rc<RefCell<S>> {}
