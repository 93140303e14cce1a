//! # Vigil - Observable Containers
//!
//! Vigil wraps ordinary Rust containers so that every mutation made through
//! the wrapper is reported, synchronously and in order, to registered
//! listeners.
//!
//! ## Features
//!
//! - **Transparent**: reads go straight to your `Vec`, `HashSet`, `BTreeMap`, ...
//! - **Precise**: one [`Change`] per effective mutation, listing what was added
//!   or removed
//! - **Live views**: key, value and entry views of a mapping report their
//!   removals back to the mapping's listeners
//! - **Batteries**: logging, collecting, counting and property-change listeners
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use vigil::prelude::*;
//!
//! let counter = Rc::new(ChangeCounter::new());
//! let vigil = Vigil::builder()
//!     .with_label("todo")
//!     .with_counter(Rc::clone(&counter))
//!     .build();
//!
//! let mut todo = vigil.list(vec!["write", "test"]);
//! todo.add("ship").unwrap();
//! todo.remove(&"write").unwrap();
//!
//! assert_eq!(*todo, vec!["test", "ship"]);
//! assert_eq!(counter.stats().changes, 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Your Application                     │
//! ├─────────────────────────────────────────────────────────┤
//! │                      vigil (facade)                     │
//! │                    ┌─────────────────┐                  │
//! │                    │  Vigil Builder  │                  │
//! │                    └────────┬────────┘                  │
//! │                             │                           │
//! │  ┌──────────────┬──────────┴────────┬───────────────┐   │
//! │  │ vigil-core   │ vigil-collections │ vigil-observe │   │
//! │  │ (changes,    │ (wrappers,        │ (listeners,   │   │
//! │  │  listeners)  │  views)           │  property)    │   │
//! │  └──────────────┴───────────────────┴───────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │               std containers (your delegate)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::Level;
use vigil_collections::{
    Collection, Mapping, ObservableCollection, ObservableMap, ObservableSet, SetCollection,
};
use vigil_core::{Observable, ObserveConfig};
use vigil_observe::{ChangeCounter, LoggingListener, PropertyChangeSupport, property_change_adapter};

// Re-export from sub-crates
pub use vigil_collections;
pub use vigil_core;
pub use vigil_observe;

pub use vigil_core::{Change, CollectionError, CollectionResult, MapChange};

/// Main entry point for Vigil.
///
/// Holds the settings containers are created with: a configuration template
/// and the listeners attached to every new container.
#[derive(Clone, Default)]
pub struct Vigil {
    config: ObserveConfig,
    log_level: Option<Level>,
    counter: Option<Rc<ChangeCounter>>,
    property: Option<(Rc<PropertyChangeSupport>, String)>,
}

impl Vigil {
    /// Create a new builder.
    pub fn builder() -> VigilBuilder {
        VigilBuilder::new()
    }

    /// The same settings, with a different label.
    pub fn labeled(&self, label: impl Into<String>) -> Self {
        let mut vigil = self.clone();
        vigil.config.label = Some(label.into());
        vigil
    }

    /// Get the configuration template.
    pub fn config(&self) -> &ObserveConfig {
        &self.config
    }

    /// Get the shared counter, if one was configured.
    pub fn counter(&self) -> Option<&Rc<ChangeCounter>> {
        self.counter.as_ref()
    }

    /// Observe any collection.
    pub fn collection<D>(&self, delegate: D) -> ObservableCollection<D>
    where
        D: Collection,
        D::Item: fmt::Debug,
    {
        let mut collection = ObservableCollection::with_config(delegate, self.config.clone());
        self.attach(&mut collection);
        collection
    }

    /// Observe a vector.
    pub fn list<T>(&self, items: Vec<T>) -> ObservableCollection<Vec<T>>
    where
        T: Clone + PartialEq + fmt::Debug,
    {
        self.collection(items)
    }

    /// Observe any set.
    pub fn set<D>(&self, delegate: D) -> ObservableSet<D>
    where
        D: SetCollection,
        D::Item: fmt::Debug,
    {
        let mut set = ObservableSet::with_config(delegate, self.config.clone());
        self.attach(&mut set);
        set
    }

    /// An empty observable hash set.
    pub fn hash_set<T>(&self) -> ObservableSet<HashSet<T>>
    where
        T: Eq + Hash + Clone + fmt::Debug,
    {
        self.set(HashSet::new())
    }

    /// An empty observable ordered set.
    pub fn btree_set<T>(&self) -> ObservableSet<BTreeSet<T>>
    where
        T: Ord + Clone + fmt::Debug,
    {
        self.set(BTreeSet::new())
    }

    /// Observe any mapping.
    pub fn map<M>(&self, delegate: M) -> ObservableMap<M>
    where
        M: Mapping,
        M::Key: fmt::Debug,
        M::Value: fmt::Debug,
    {
        let mut map = ObservableMap::with_config(delegate, self.config.clone());
        self.attach(&mut map);
        map
    }

    /// An empty observable hash map.
    pub fn hash_map<K, V>(&self) -> ObservableMap<HashMap<K, V>>
    where
        K: Eq + Hash + Clone + fmt::Debug,
        V: Clone + PartialEq + fmt::Debug,
    {
        self.map(HashMap::new())
    }

    /// An empty observable ordered map.
    pub fn btree_map<K, V>(&self) -> ObservableMap<BTreeMap<K, V>>
    where
        K: Ord + Clone + fmt::Debug,
        V: Clone + PartialEq + fmt::Debug,
    {
        self.map(BTreeMap::new())
    }

    fn attach<T, O>(&self, target: &mut O)
    where
        T: fmt::Debug,
        O: Observable<T>,
    {
        if let Some(level) = self.log_level {
            let mut listener = LoggingListener::new().with_level(level);
            if let Some(label) = &self.config.label {
                listener = listener.with_label(label.clone());
            }
            target.add_listener(Rc::new(listener));
        }
        if let Some(counter) = &self.counter {
            target.add_listener(Rc::clone(counter) as Rc<dyn vigil_core::ChangeListener<T>>);
        }
        if let Some((support, property)) = &self.property {
            property_change_adapter(support, target, property.clone());
        }
    }
}

impl fmt::Debug for Vigil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vigil")
            .field("config", &self.config)
            .field("log_level", &self.log_level)
            .field("counter", &self.counter.is_some())
            .field("property", &self.property.as_ref().map(|(_, name)| name))
            .finish()
    }
}

/// Builder for configuring [`Vigil`].
#[derive(Default)]
pub struct VigilBuilder {
    config: ObserveConfig,
    log_level: Option<Level>,
    counter: Option<Rc<ChangeCounter>>,
    property: Option<(Rc<PropertyChangeSupport>, String)>,
}

impl VigilBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label containers are created with.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Enable or disable per-change trace records.
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.config.trace_dispatch = enabled;
        self
    }

    /// Set the whole configuration template.
    pub fn with_config(mut self, config: ObserveConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a [`LoggingListener`] at `level` to every container.
    pub fn with_logging(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Attach a shared [`ChangeCounter`] to every container.
    pub fn with_counter(mut self, counter: Rc<ChangeCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Fire `property` through `support` whenever any container changes.
    pub fn with_property_support(
        mut self,
        support: Rc<PropertyChangeSupport>,
        property: impl Into<String>,
    ) -> Self {
        self.property = Some((support, property.into()));
        self
    }

    /// Build the configured [`Vigil`].
    pub fn build(self) -> Vigil {
        Vigil {
            config: self.config,
            log_level: self.log_level,
            counter: self.counter,
            property: self.property,
        }
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{Vigil, VigilBuilder};

    pub use vigil_core::{
        Change, ChangeListener, CollectionError, CollectionResult, ContainerId, ListenerId,
        MapChange, MutationKind, Observable, ObserveConfig, SharedListener, ViewKind,
    };

    pub use vigil_collections::{
        Collection, Cursor, EntryView, KeyView, Mapping, ObservableCollection, ObservableMap,
        ObservableSet, SetCollection, ValueView,
    };

    pub use vigil_observe::{
        ChangeCounter, ChangeStats, CollectingListener, LoggingListener, PropertyChangeEvent,
        PropertyChangeListener, PropertyChangeSupport, property_change_adapter,
    };

    pub use std::rc::Rc;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
    use std::hash::{DefaultHasher, Hash, Hasher};

    fn letters() -> Vec<&'static str> {
        vec!["A", "B", "C", "D", "E", "F"]
    }

    fn collector<T: Clone + 'static>() -> (Rc<CollectingListener<T>>, SharedListener<T>) {
        let collector = Rc::new(CollectingListener::new(100));
        let listener: SharedListener<T> = Rc::clone(&collector) as SharedListener<T>;
        (collector, listener)
    }

    #[test]
    fn test_vigil_builder() {
        let counter = Rc::new(ChangeCounter::new());
        let vigil = Vigil::builder()
            .with_label("inventory")
            .with_trace_dispatch(false)
            .with_counter(Rc::clone(&counter))
            .build();

        assert_eq!(vigil.config().label.as_deref(), Some("inventory"));
        assert!(!vigil.config().trace_dispatch);
        assert!(vigil.counter().is_some());

        let list = vigil.list(vec![1]);
        assert_eq!(list.label(), Some("inventory"));
        assert_eq!(list.listener_count(), 1);

        let renamed = vigil.labeled("archive").btree_set::<u8>();
        assert_eq!(renamed.label(), Some("archive"));
    }

    #[test]
    fn test_list_add_all_reports_argument() {
        let mut list = ObservableCollection::new(letters());
        let (changes, listener) = collector();
        list.subscribe(listener);

        list.add_all(["F", "G", "H"]).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.changes()[0].added(), &["F", "G", "H"]);
        assert_eq!(list.len(), 9);
    }

    #[test]
    fn test_set_add_all_reports_argument() {
        let mut set = ObservableSet::new(letters().into_iter().collect::<HashSet<_>>());
        let (changes, listener) = collector();
        set.subscribe(listener);

        set.add_all(["F", "G", "H"]).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.changes()[0].added(), &["F", "G", "H"]);
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn test_single_add_and_remove() {
        let mut set = ObservableSet::new(letters().into_iter().collect::<BTreeSet<_>>());
        let (changes, listener) = collector();
        set.subscribe(listener);

        set.add("G").unwrap();
        set.remove(&"A").unwrap();

        let changes = changes.changes();
        assert_eq!(changes.len(), 2);
        assert!(changes[0].removed().is_empty());
        assert_eq!(changes[0].added(), &["G"]);
        assert!(changes[1].added().is_empty());
        assert_eq!(changes[1].removed(), &["A"]);
    }

    #[test]
    fn test_remove_all_and_retain_all() {
        let mut list = ObservableCollection::new(letters());
        let (changes, listener) = collector();
        list.subscribe(listener);

        list.remove_all(["A", "C", "Z"]).unwrap();
        assert_eq!(changes.last().unwrap().removed(), &["A", "C", "Z"]);
        assert_eq!(list.len(), 4);

        let mut set = ObservableSet::new(letters().into_iter().collect::<HashSet<_>>());
        let (set_changes, listener) = collector();
        set.subscribe(listener);

        set.retain_all(["A", "Z"]).unwrap();
        assert_eq!(set_changes.len(), 1);
        assert!(!set_changes.changes()[0].removed().is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear_asymmetry() {
        let mut list = ObservableCollection::new(Vec::<u8>::new());
        let (list_changes, listener) = collector();
        list.subscribe(listener);
        list.clear().unwrap();
        assert!(list_changes.is_empty());

        let mut map = ObservableMap::new(HashMap::<u8, u8>::new());
        let (map_changes, listener) = collector();
        map.subscribe(listener);
        map.clear().unwrap();
        assert_eq!(map_changes.len(), 1);
        assert!(map_changes.changes()[0].removed().is_empty());
    }

    #[test]
    fn test_derived_views_forward_to_mapping() {
        let mut map = ObservableMap::new(BTreeMap::from([
            ("1", "A"),
            ("2", "B"),
            ("3", "C"),
            ("4", "D"),
        ]));
        let (changes, listener) = collector();
        map.subscribe(listener);

        map.key_set().remove(&"4").unwrap();
        assert_eq!(changes.last().unwrap().removed(), &[("4", "D")]);

        map.entry_set().remove(&("3", "C")).unwrap();
        assert_eq!(changes.last().unwrap().removed(), &[("3", "C")]);

        assert!(map.values().clear().unwrap_err().is_unsupported());
        assert!(map.key_set().add("9").unwrap_err().is_unsupported());
        assert_eq!(map.len(), 2);
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_property_support_with_views() {
        let support = Rc::new(PropertyChangeSupport::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        support.add_listener(Rc::new(move |event: &PropertyChangeEvent| {
            sink.borrow_mut().push(event.property().to_string())
        }));

        let vigil = Vigil::builder()
            .with_property_support(Rc::clone(&support), "prices")
            .build();
        let mut prices = vigil.btree_map();
        prices.put("apple", 3).unwrap();
        prices.key_set().remove(&"apple").unwrap();

        assert_eq!(*events.borrow(), vec!["prices", "prices"]);
    }

    #[test]
    fn test_logging_and_counting_listeners() {
        let counter = Rc::new(ChangeCounter::new());
        let vigil = Vigil::builder()
            .with_logging(tracing::Level::INFO)
            .with_counter(Rc::clone(&counter))
            .build();

        let mut map = vigil.hash_map();
        map.put("4", "D").unwrap();
        map.put("4", "DD").unwrap();
        map.remove(&"4").unwrap();
        assert_eq!(map.listener_count(), 2);

        let stats = counter.stats();
        assert_eq!(stats.changes, 3);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.removed_elements, 2);
    }

    #[test]
    fn test_equality_and_hash_ignore_listeners() {
        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let vigil = Vigil::builder()
            .with_counter(Rc::new(ChangeCounter::new()))
            .build();
        let observed = vigil.collection(letters());
        let plain = ObservableCollection::new(letters());

        assert_eq!(observed, plain);
        assert_eq!(hash_of(&observed), hash_of(&plain));
    }

    #[test]
    fn test_cursor_drains_set() {
        let mut set = ObservableSet::new(letters().into_iter().collect::<HashSet<_>>());
        let (changes, listener) = collector();
        set.subscribe(listener);

        let mut cursor = set.cursor();
        while cursor.next().is_some() {
            cursor.remove().unwrap();
        }
        drop(cursor);

        assert!(set.is_empty());
        assert_eq!(changes.len(), 6);
        assert!(changes.changes().iter().all(|change| change.removed().len() == 1));
    }

    #[test]
    fn test_prelude_imports() {
        let _ = Vigil::builder().build();
        let _ = ObserveConfig::quiet();
        let _ = ContainerId::new();
    }
}
