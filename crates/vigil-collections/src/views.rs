//! Live views of an observable mapping.
//!
//! A view mutably borrows its mapping (the value view only reads it), so it
//! cannot outlive the mapping and nothing else can touch the mapping while
//! the view is alive. Every view has its own listeners and container id.
//!
//! Key and entry views re-dispatch their removals on the mapping's listeners
//! as `(key, value)` pairs, before their own listeners see the element-level
//! change. Additions through these views are rejected; the value view
//! rejects every mutation.

use std::fmt;

use tracing::warn;
use vigil_core::{Change, CollectionError, CollectionResult, MutationKind, ViewKind};

use crate::bridge::Bridge;
use crate::collection::ObservableCollection;
use crate::delegate::{Collection, SetCollection};
use crate::map::MapDispatch;
use crate::mapping::Mapping;
use crate::set::ObservableSet;

/// Live key set of an [`ObservableMap`](crate::ObservableMap).
pub type KeyView<'m, M> =
    ObservableSet<Keys<'m, M>, KeyBridge<'m, <M as Mapping>::Key, <M as Mapping>::Value>>;

/// Live value collection of an [`ObservableMap`](crate::ObservableMap).
pub type ValueView<'m, M> = ObservableCollection<Values<'m, M>, ValueBridge>;

/// Live entry set of an [`ObservableMap`](crate::ObservableMap).
pub type EntryView<'m, M> =
    ObservableSet<Entries<'m, M>, EntryBridge<'m, <M as Mapping>::Key, <M as Mapping>::Value>>;

fn reject(view: ViewKind, mutation: MutationKind) -> CollectionResult<()> {
    warn!(view = %view, mutation = %mutation, "Derived view rejected mutation");
    Err(CollectionError::unsupported(view, mutation))
}

fn reject_additions(view: ViewKind, mutation: MutationKind) -> CollectionResult<()> {
    if mutation.is_addition() {
        return reject(view, mutation);
    }
    Ok(())
}

/// The keys of a mapping, as a [`Collection`].
pub struct Keys<'m, M: Mapping> {
    map: &'m mut M,
}

impl<'m, M: Mapping> Keys<'m, M> {
    pub(crate) fn new(map: &'m mut M) -> Self {
        Self { map }
    }

    /// The underlying mapping.
    pub fn mapping(&self) -> &M {
        &*self.map
    }
}

impl<M: Mapping> Collection for Keys<'_, M> {
    type Item = M::Key;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn has(&self, key: &M::Key) -> bool {
        self.map.has_key(key)
    }

    fn snapshot(&self) -> Vec<M::Key> {
        self.map.key_list()
    }

    fn try_snapshot(&self) -> CollectionResult<Vec<M::Key>> {
        let entries = self.map.try_entry_list()?;
        Ok(entries.into_iter().map(|(key, _)| key).collect())
    }

    fn add(&mut self, _key: M::Key) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Keys, MutationKind::Add))
    }

    fn add_all(&mut self, _keys: &[M::Key]) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Keys, MutationKind::AddAll))
    }

    fn remove(&mut self, key: &M::Key) -> CollectionResult<bool> {
        Ok(self.map.remove_key(key)?.is_some())
    }

    fn clear(&mut self) -> CollectionResult<()> {
        self.map.clear()
    }
}

impl<M: Mapping> SetCollection for Keys<'_, M> {}

impl<M> fmt::Debug for Keys<'_, M>
where
    M: Mapping,
    M::Key: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.key_list()).finish()
    }
}

/// The values of a mapping, as a read-only [`Collection`].
pub struct Values<'m, M: Mapping> {
    map: &'m M,
}

impl<'m, M: Mapping> Values<'m, M> {
    pub(crate) fn new(map: &'m M) -> Self {
        Self { map }
    }

    /// The underlying mapping.
    pub fn mapping(&self) -> &M {
        self.map
    }
}

impl<M: Mapping> Collection for Values<'_, M> {
    type Item = M::Value;

    fn size(&self) -> usize {
        self.map.size()
    }

    fn has(&self, value: &M::Value) -> bool {
        self.map.value_list().contains(value)
    }

    fn snapshot(&self) -> Vec<M::Value> {
        self.map.value_list()
    }

    fn add(&mut self, _value: M::Value) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::Add))
    }

    fn remove(&mut self, _value: &M::Value) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::Remove))
    }

    fn remove_at(&mut self, _index: usize, _expected: &M::Value) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::CursorRemove))
    }

    fn add_all(&mut self, _values: &[M::Value]) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::AddAll))
    }

    fn remove_all(&mut self, _values: &[M::Value]) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::RemoveAll))
    }

    fn retain_all(&mut self, _values: &[M::Value]) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::RetainAll))
    }

    fn clear(&mut self) -> CollectionResult<()> {
        Err(CollectionError::unsupported(ViewKind::Values, MutationKind::Clear))
    }
}

impl<M> fmt::Debug for Values<'_, M>
where
    M: Mapping,
    M::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.map.value_list()).finish()
    }
}

/// The `(key, value)` pairs of a mapping, as a [`Collection`].
pub struct Entries<'m, M: Mapping> {
    map: &'m mut M,
}

impl<'m, M: Mapping> Entries<'m, M> {
    pub(crate) fn new(map: &'m mut M) -> Self {
        Self { map }
    }

    /// The underlying mapping.
    pub fn mapping(&self) -> &M {
        &*self.map
    }
}

impl<M: Mapping> Collection for Entries<'_, M> {
    type Item = (M::Key, M::Value);

    fn size(&self) -> usize {
        self.map.size()
    }

    fn has(&self, entry: &(M::Key, M::Value)) -> bool {
        let (key, value) = entry;
        self.map.value_of(key).as_ref() == Some(value)
    }

    fn snapshot(&self) -> Vec<(M::Key, M::Value)> {
        self.map.entry_list()
    }

    fn try_snapshot(&self) -> CollectionResult<Vec<(M::Key, M::Value)>> {
        self.map.try_entry_list()
    }

    fn add(&mut self, _entry: (M::Key, M::Value)) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Entries, MutationKind::Add))
    }

    fn add_all(&mut self, _entries: &[(M::Key, M::Value)]) -> CollectionResult<bool> {
        Err(CollectionError::unsupported(ViewKind::Entries, MutationKind::AddAll))
    }

    fn remove(&mut self, entry: &(M::Key, M::Value)) -> CollectionResult<bool> {
        let (key, value) = entry;
        // A pair whose value differs is not a member.
        if self.map.try_value_of(key)?.as_ref() != Some(value) {
            return Ok(false);
        }
        Ok(self.map.remove_key(key)?.is_some())
    }

    fn clear(&mut self) -> CollectionResult<()> {
        self.map.clear()
    }
}

impl<M: Mapping> SetCollection for Entries<'_, M> {}

impl<M> fmt::Debug for Entries<'_, M>
where
    M: Mapping,
    M::Key: fmt::Debug,
    M::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.entry_list()).finish()
    }
}

/// Re-dispatches key removals on the owning mapping.
pub struct KeyBridge<'m, K, V> {
    dispatch: MapDispatch<'m, K, V>,
}

impl<'m, K, V> KeyBridge<'m, K, V> {
    pub(crate) fn new(dispatch: MapDispatch<'m, K, V>) -> Self {
        Self { dispatch }
    }
}

impl<'k, M: Mapping> Bridge<Keys<'k, M>> for KeyBridge<'_, M::Key, M::Value> {
    type Snapshot = M::Snapshot;

    fn admit(&self, mutation: MutationKind) -> CollectionResult<()> {
        reject_additions(ViewKind::Keys, mutation)
    }

    fn prepare(&self, keys: &Keys<'k, M>) -> CollectionResult<M::Snapshot> {
        keys.mapping().try_snapshot()
    }

    fn forward(&self, before: M::Snapshot, change: &Change<M::Key>) {
        // Keys that were never bound have no pair to report.
        let entries = change
            .removed()
            .iter()
            .filter_map(|key| before.value_of(key).map(|value| (key.clone(), value)))
            .collect();
        self.dispatch
            .fire(Change::removal(self.dispatch.source(), entries));
    }
}

/// Rejects every mutation of a value view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueBridge;

impl<'v, M: Mapping> Bridge<Values<'v, M>> for ValueBridge {
    type Snapshot = ();

    fn admit(&self, mutation: MutationKind) -> CollectionResult<()> {
        reject(ViewKind::Values, mutation)
    }

    fn prepare(&self, _values: &Values<'v, M>) -> CollectionResult<()> {
        Ok(())
    }

    fn forward(&self, _snapshot: (), _change: &Change<M::Value>) {}
}

/// Re-dispatches entry removals on the owning mapping.
pub struct EntryBridge<'m, K, V> {
    dispatch: MapDispatch<'m, K, V>,
}

impl<'m, K, V> EntryBridge<'m, K, V> {
    pub(crate) fn new(dispatch: MapDispatch<'m, K, V>) -> Self {
        Self { dispatch }
    }
}

impl<'e, M: Mapping> Bridge<Entries<'e, M>> for EntryBridge<'_, M::Key, M::Value> {
    type Snapshot = ();

    fn admit(&self, mutation: MutationKind) -> CollectionResult<()> {
        reject_additions(ViewKind::Entries, mutation)
    }

    fn prepare(&self, _entries: &Entries<'e, M>) -> CollectionResult<()> {
        Ok(())
    }

    fn forward(&self, _snapshot: (), change: &Change<(M::Key, M::Value)>) {
        self.dispatch
            .fire(Change::removal(self.dispatch.source(), change.removed().to_vec()));
    }
}
