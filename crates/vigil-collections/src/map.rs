//! Observable wrapper over a [`Mapping`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use tracing::{debug, trace};
use vigil_core::{
    Change, CollectionResult, ContainerId, ListenerId, ListenerRegistry, MapChange, Observable,
    ObserveConfig, SharedListener, ViewKind,
};

use crate::collection::ObservableCollection;
use crate::mapping::Mapping;
use crate::set::ObservableSet;
use crate::views::{
    EntryBridge, EntryView, Entries, KeyBridge, KeyView, Keys, ValueBridge, ValueView, Values,
};

/// Borrowed dispatch handle of a mapping, shared with its views.
pub(crate) struct MapDispatch<'m, K, V> {
    listeners: &'m ListenerRegistry<(K, V)>,
    source: ContainerId,
    config: &'m ObserveConfig,
}

impl<K, V> MapDispatch<'_, K, V> {
    pub(crate) fn source(&self) -> ContainerId {
        self.source
    }

    pub(crate) fn fire(&self, change: MapChange<K, V>) {
        if self.config.trace_dispatch {
            trace!(
                container = %self.source,
                label = self.config.label_str(),
                added = change.added().len(),
                removed = change.removed().len(),
                listeners = self.listeners.len(),
                "Dispatching mapping change"
            );
        }
        self.listeners.dispatch(&change);
    }
}

/// A key/value container that notifies its listeners after every mutation.
///
/// Unlike the collection wrappers, `put`, `put_all` and `clear` always
/// dispatch, even when they leave the contents unchanged.
///
/// Equality and hashing are those of the delegate; the container id and the
/// listeners are not compared. `Hash` is therefore only available for
/// hashable delegates such as `BTreeMap`, not for `HashMap`.
pub struct ObservableMap<M: Mapping> {
    delegate: M,
    listeners: ListenerRegistry<(M::Key, M::Value)>,
    id: ContainerId,
    config: ObserveConfig,
}

impl<K, V> ObservableMap<HashMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// An empty observable hash map.
    pub fn hash_map() -> Self {
        Self::new(HashMap::new())
    }
}

impl<K, V> ObservableMap<BTreeMap<K, V>>
where
    K: Ord + Clone,
    V: Clone + PartialEq,
{
    /// An empty observable ordered map.
    pub fn btree_map() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl<M: Mapping> ObservableMap<M> {
    /// Wrap `delegate` with the default configuration.
    pub fn new(delegate: M) -> Self {
        Self::with_config(delegate, ObserveConfig::default())
    }

    /// Wrap `delegate` with a custom configuration.
    pub fn with_config(delegate: M, config: ObserveConfig) -> Self {
        let id = ContainerId::new();
        debug!(container = %id, label = config.label_str(), "Observable mapping created");

        Self {
            delegate,
            listeners: ListenerRegistry::new(),
            id,
            config,
        }
    }

    /// Get the container ID.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Get the configuration.
    pub fn config(&self) -> &ObserveConfig {
        &self.config
    }

    /// Get the label, if one was configured.
    pub fn label(&self) -> Option<&str> {
        self.config.label.as_deref()
    }

    /// Borrow the delegate.
    pub fn get_ref(&self) -> &M {
        &self.delegate
    }

    /// Unwrap the delegate. Listeners are dropped.
    pub fn into_inner(self) -> M {
        self.delegate
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: SharedListener<(M::Key, M::Value)>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Register a closure as a listener.
    pub fn listen<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&MapChange<M::Key, M::Value>) + 'static,
    {
        self.subscribe(Rc::new(listener))
    }

    /// Unregister a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Bind `key` to `value`, returning the previous value.
    ///
    /// A new key dispatches an addition. A bound key dispatches an update
    /// carrying the old pair, even when the value is unchanged.
    pub fn put(&mut self, key: M::Key, value: M::Value) -> CollectionResult<Option<M::Value>> {
        let previous = self.delegate.put(key.clone(), value.clone())?;

        let change = match &previous {
            None => Change::addition(self.id, vec![(key, value)]),
            Some(old) => {
                let replaced = vec![(key.clone(), old.clone())];
                Change::update(self.id, replaced, vec![(key, value)])
            }
        };
        self.fire(change);
        Ok(previous)
    }

    /// Unbind `key`, returning its value. Absent keys dispatch nothing.
    pub fn remove(&mut self, key: &M::Key) -> CollectionResult<Option<M::Value>> {
        let Some(value) = self.delegate.remove_key(key)? else {
            return Ok(None);
        };

        self.fire(Change::removal(self.id, vec![(key.clone(), value.clone())]));
        Ok(Some(value))
    }

    /// Bind every entry.
    ///
    /// Dispatches one update: `removed` holds the previous pairs of keys that
    /// were already bound, `added` holds every supplied entry.
    pub fn put_all<I>(&mut self, entries: I) -> CollectionResult<()>
    where
        I: IntoIterator<Item = (M::Key, M::Value)>,
    {
        let entries: Vec<(M::Key, M::Value)> = entries.into_iter().collect();

        let mut replaced: Vec<(M::Key, M::Value)> = Vec::new();
        for (key, _) in &entries {
            if replaced.iter().any(|(seen, _)| seen == key) {
                continue;
            }
            if let Some(old) = self.delegate.try_value_of(key)? {
                replaced.push((key.clone(), old));
            }
        }

        self.delegate.put_all(&entries)?;
        self.fire(Change::update(self.id, replaced, entries));
        Ok(())
    }

    /// Remove every entry. Always dispatches a removal of the prior entries.
    pub fn clear(&mut self) -> CollectionResult<()> {
        let before = self.delegate.try_entry_list()?;

        self.delegate.clear()?;
        self.fire(Change::removal(self.id, before));
        Ok(())
    }

    /// Live set of keys. Removing a key removes its entry.
    pub fn key_set(&mut self) -> KeyView<'_, M> {
        let config = self.config.derive(ViewKind::Keys.suffix());
        let bridge = KeyBridge::new(MapDispatch {
            listeners: &self.listeners,
            source: self.id,
            config: &self.config,
        });

        ObservableSet::from_collection(ObservableCollection::with_bridge(
            Keys::new(&mut self.delegate),
            bridge,
            config,
        ))
    }

    /// Live, read-only collection of values.
    pub fn values(&self) -> ValueView<'_, M> {
        let config = self.config.derive(ViewKind::Values.suffix());
        ObservableCollection::with_bridge(Values::new(&self.delegate), ValueBridge, config)
    }

    /// Live set of `(key, value)` pairs. Removing a pair removes its entry.
    pub fn entry_set(&mut self) -> EntryView<'_, M> {
        let config = self.config.derive(ViewKind::Entries.suffix());
        let bridge = EntryBridge::new(MapDispatch {
            listeners: &self.listeners,
            source: self.id,
            config: &self.config,
        });

        ObservableSet::from_collection(ObservableCollection::with_bridge(
            Entries::new(&mut self.delegate),
            bridge,
            config,
        ))
    }

    fn fire(&self, change: MapChange<M::Key, M::Value>) {
        MapDispatch {
            listeners: &self.listeners,
            source: self.id,
            config: &self.config,
        }
        .fire(change);
    }
}

impl<M: Mapping> Deref for ObservableMap<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.delegate
    }
}

impl<M: Mapping + PartialEq> PartialEq for ObservableMap<M> {
    fn eq(&self, other: &Self) -> bool {
        self.delegate == other.delegate
    }
}

impl<M: Mapping + Eq> Eq for ObservableMap<M> {}

impl<M: Mapping + Hash> Hash for ObservableMap<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.delegate.hash(state);
    }
}

impl<M: Mapping + fmt::Debug> fmt::Debug for ObservableMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("label", &self.config.label)
            .field("delegate", &self.delegate)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl<M: Mapping> Observable<(M::Key, M::Value)> for ObservableMap<M> {
    fn container_id(&self) -> ContainerId {
        self.id
    }

    fn add_listener(&mut self, listener: SharedListener<(M::Key, M::Value)>) -> ListenerId {
        self.subscribe(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.unsubscribe(id)
    }
}
