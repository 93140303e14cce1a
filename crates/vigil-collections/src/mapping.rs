//! Key/value containers an observable mapping can delegate to.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::rc::Rc;

use vigil_core::{CollectionError, CollectionResult};

/// A mutable key/value container.
pub trait Mapping {
    /// Key type.
    type Key: Clone + PartialEq;
    /// Value type.
    type Value: Clone + PartialEq;
    /// Detached copy of the contents, used to resolve values of keys removed
    /// through a key view.
    type Snapshot: Mapping<Key = Self::Key, Value = Self::Value>;

    /// Number of entries.
    fn size(&self) -> usize;

    /// Whether `key` is bound.
    fn has_key(&self, key: &Self::Key) -> bool;

    /// The value bound to `key`.
    fn value_of(&self, key: &Self::Key) -> Option<Self::Value>;

    /// Every entry, in iteration order.
    fn entry_list(&self) -> Vec<(Self::Key, Self::Value)>;

    /// Every key, in iteration order.
    fn key_list(&self) -> Vec<Self::Key> {
        self.entry_list().into_iter().map(|(key, _)| key).collect()
    }

    /// Every value, in iteration order.
    fn value_list(&self) -> Vec<Self::Value> {
        self.entry_list().into_iter().map(|(_, value)| value).collect()
    }

    /// Copy the current contents.
    fn snapshot(&self) -> Self::Snapshot;

    /// Fallible [`value_of`](Mapping::value_of), for mutations that read the
    /// delegate before writing it.
    fn try_value_of(&self, key: &Self::Key) -> CollectionResult<Option<Self::Value>> {
        Ok(self.value_of(key))
    }

    /// Fallible [`entry_list`](Mapping::entry_list).
    fn try_entry_list(&self) -> CollectionResult<Vec<(Self::Key, Self::Value)>> {
        Ok(self.entry_list())
    }

    /// Fallible [`snapshot`](Mapping::snapshot).
    fn try_snapshot(&self) -> CollectionResult<Self::Snapshot> {
        Ok(self.snapshot())
    }

    /// Bind `key` to `value`, returning the previous value.
    fn put(&mut self, key: Self::Key, value: Self::Value) -> CollectionResult<Option<Self::Value>>;

    /// Unbind `key`, returning its value.
    fn remove_key(&mut self, key: &Self::Key) -> CollectionResult<Option<Self::Value>>;

    /// Bind every entry, in order. Later entries win for repeated keys.
    fn put_all(&mut self, entries: &[(Self::Key, Self::Value)]) -> CollectionResult<()> {
        for (key, value) in entries {
            self.put(key.clone(), value.clone())?;
        }
        Ok(())
    }

    /// Remove every entry.
    fn clear(&mut self) -> CollectionResult<()>;
}

impl<K, V> Mapping for HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    type Key = K;
    type Value = V;
    type Snapshot = HashMap<K, V>;

    fn size(&self) -> usize {
        self.len()
    }

    fn has_key(&self, key: &K) -> bool {
        self.contains_key(key)
    }

    fn value_of(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }

    fn entry_list(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn key_list(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    fn value_list(&self) -> Vec<V> {
        self.values().cloned().collect()
    }

    fn snapshot(&self) -> HashMap<K, V> {
        self.clone()
    }

    fn put(&mut self, key: K, value: V) -> CollectionResult<Option<V>> {
        Ok(self.insert(key, value))
    }

    fn remove_key(&mut self, key: &K) -> CollectionResult<Option<V>> {
        Ok(self.remove(key))
    }

    fn clear(&mut self) -> CollectionResult<()> {
        HashMap::clear(self);
        Ok(())
    }
}

impl<K, V> Mapping for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    type Key = K;
    type Value = V;
    type Snapshot = BTreeMap<K, V>;

    fn size(&self) -> usize {
        self.len()
    }

    fn has_key(&self, key: &K) -> bool {
        self.contains_key(key)
    }

    fn value_of(&self, key: &K) -> Option<V> {
        self.get(key).cloned()
    }

    fn entry_list(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn key_list(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    fn value_list(&self) -> Vec<V> {
        self.values().cloned().collect()
    }

    fn snapshot(&self) -> BTreeMap<K, V> {
        self.clone()
    }

    fn put(&mut self, key: K, value: V) -> CollectionResult<Option<V>> {
        Ok(self.insert(key, value))
    }

    fn remove_key(&mut self, key: &K) -> CollectionResult<Option<V>> {
        Ok(self.remove(key))
    }

    fn clear(&mut self) -> CollectionResult<()> {
        BTreeMap::clear(self);
        Ok(())
    }
}

impl<M: Mapping + ?Sized> Mapping for &mut M {
    type Key = M::Key;
    type Value = M::Value;
    type Snapshot = M::Snapshot;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn has_key(&self, key: &M::Key) -> bool {
        (**self).has_key(key)
    }

    fn value_of(&self, key: &M::Key) -> Option<M::Value> {
        (**self).value_of(key)
    }

    fn entry_list(&self) -> Vec<(M::Key, M::Value)> {
        (**self).entry_list()
    }

    fn key_list(&self) -> Vec<M::Key> {
        (**self).key_list()
    }

    fn value_list(&self) -> Vec<M::Value> {
        (**self).value_list()
    }

    fn snapshot(&self) -> M::Snapshot {
        (**self).snapshot()
    }

    fn try_value_of(&self, key: &M::Key) -> CollectionResult<Option<M::Value>> {
        (**self).try_value_of(key)
    }

    fn try_entry_list(&self) -> CollectionResult<Vec<(M::Key, M::Value)>> {
        (**self).try_entry_list()
    }

    fn try_snapshot(&self) -> CollectionResult<M::Snapshot> {
        (**self).try_snapshot()
    }

    fn put(&mut self, key: M::Key, value: M::Value) -> CollectionResult<Option<M::Value>> {
        (**self).put(key, value)
    }

    fn remove_key(&mut self, key: &M::Key) -> CollectionResult<Option<M::Value>> {
        (**self).remove_key(key)
    }

    fn put_all(&mut self, entries: &[(M::Key, M::Value)]) -> CollectionResult<()> {
        (**self).put_all(entries)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        (**self).clear()
    }
}

/// Shared delegates. Plain reads panic on a conflicting borrow; the `try_*`
/// reads and every write return [`CollectionError::Delegate`] instead.
impl<M: Mapping> Mapping for Rc<RefCell<M>> {
    type Key = M::Key;
    type Value = M::Value;
    type Snapshot = M::Snapshot;

    fn size(&self) -> usize {
        (**self).borrow().size()
    }

    fn has_key(&self, key: &M::Key) -> bool {
        (**self).borrow().has_key(key)
    }

    fn value_of(&self, key: &M::Key) -> Option<M::Value> {
        (**self).borrow().value_of(key)
    }

    fn entry_list(&self) -> Vec<(M::Key, M::Value)> {
        (**self).borrow().entry_list()
    }

    fn key_list(&self) -> Vec<M::Key> {
        (**self).borrow().key_list()
    }

    fn value_list(&self) -> Vec<M::Value> {
        (**self).borrow().value_list()
    }

    fn snapshot(&self) -> M::Snapshot {
        (**self).borrow().snapshot()
    }

    fn try_value_of(&self, key: &M::Key) -> CollectionResult<Option<M::Value>> {
        self.try_borrow()
            .map_err(CollectionError::delegate)?
            .try_value_of(key)
    }

    fn try_entry_list(&self) -> CollectionResult<Vec<(M::Key, M::Value)>> {
        self.try_borrow()
            .map_err(CollectionError::delegate)?
            .try_entry_list()
    }

    fn try_snapshot(&self) -> CollectionResult<M::Snapshot> {
        self.try_borrow()
            .map_err(CollectionError::delegate)?
            .try_snapshot()
    }

    fn put(&mut self, key: M::Key, value: M::Value) -> CollectionResult<Option<M::Value>> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .put(key, value)
    }

    fn remove_key(&mut self, key: &M::Key) -> CollectionResult<Option<M::Value>> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .remove_key(key)
    }

    fn put_all(&mut self, entries: &[(M::Key, M::Value)]) -> CollectionResult<()> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .put_all(entries)
    }

    fn clear(&mut self) -> CollectionResult<()> {
        self.try_borrow_mut()
            .map_err(CollectionError::delegate)?
            .clear()
    }
}
