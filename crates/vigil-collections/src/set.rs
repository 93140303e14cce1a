//! Observable wrapper over a set.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

use vigil_core::{ContainerId, ListenerId, Observable, ObserveConfig, SharedListener};

use crate::bridge::{Bridge, Direct};
use crate::collection::ObservableCollection;
use crate::delegate::SetCollection;

/// An [`ObservableCollection`] whose delegate holds no duplicates.
///
/// All operations are inherited; the set contract only guarantees that
/// adding a present element is silent. Bulk additions still list their
/// whole argument.
pub struct ObservableSet<D: SetCollection, B = Direct> {
    inner: ObservableCollection<D, B>,
}

impl<D: SetCollection> ObservableSet<D> {
    /// Wrap `delegate` with the default configuration.
    pub fn new(delegate: D) -> Self {
        Self::from_collection(ObservableCollection::new(delegate))
    }

    /// Wrap `delegate` with a custom configuration.
    pub fn with_config(delegate: D, config: ObserveConfig) -> Self {
        Self::from_collection(ObservableCollection::with_config(delegate, config))
    }
}

impl<T: Eq + Hash + Clone> ObservableSet<HashSet<T>> {
    /// An empty observable hash set.
    pub fn hash_set() -> Self {
        Self::new(HashSet::new())
    }
}

impl<T: Ord + Clone> ObservableSet<BTreeSet<T>> {
    /// An empty observable ordered set.
    pub fn btree_set() -> Self {
        Self::new(BTreeSet::new())
    }
}

impl<D: SetCollection, B: Bridge<D>> ObservableSet<D, B> {
    pub(crate) fn from_collection(inner: ObservableCollection<D, B>) -> Self {
        Self { inner }
    }

    /// Unwrap the delegate. Listeners are dropped.
    pub fn into_inner(self) -> D {
        self.inner.into_inner()
    }
}

impl<D: SetCollection, B> Deref for ObservableSet<D, B> {
    type Target = ObservableCollection<D, B>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<D: SetCollection, B> DerefMut for ObservableSet<D, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<D: SetCollection + PartialEq, B> PartialEq for ObservableSet<D, B> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<D: SetCollection + Eq, B> Eq for ObservableSet<D, B> {}

impl<D: SetCollection + Hash, B> Hash for ObservableSet<D, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<D: SetCollection + fmt::Debug, B: Bridge<D>> fmt::Debug for ObservableSet<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSet")
            .field("label", &self.inner.config().label)
            .field("delegate", self.inner.get_ref())
            .field("listener_count", &self.inner.listener_count())
            .finish()
    }
}

impl<D: SetCollection, B: Bridge<D>> Observable<D::Item> for ObservableSet<D, B> {
    fn container_id(&self) -> ContainerId {
        self.inner.id()
    }

    fn add_listener(&mut self, listener: SharedListener<D::Item>) -> ListenerId {
        self.inner.subscribe(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.inner.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recorder;
    use std::collections::hash_map::DefaultHasher;

    fn letters() -> ObservableSet<HashSet<&'static str>> {
        ObservableSet::new(HashSet::from(["A", "B", "C", "D", "E", "F"]))
    }

    #[test]
    fn test_add_present_is_silent() {
        let mut set = letters();
        let (log, listener) = recorder();
        set.subscribe(listener);

        assert!(!set.add("A").unwrap());
        assert!(log.borrow().is_empty());

        assert!(set.add("G").unwrap());
        assert_eq!(log.borrow()[0].added(), &["G"]);
    }

    #[test]
    fn test_add_all_lists_whole_argument() {
        let mut set = letters();
        let (log, listener) = recorder();
        set.subscribe(listener);

        set.add_all(["A", "G"]).unwrap();
        assert_eq!(log.borrow()[0].added(), &["A", "G"]);
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn test_add_all_of_present_elements_is_silent() {
        let mut set = letters();
        let (log, listener) = recorder();
        set.subscribe(listener);

        assert!(!set.add_all(["A", "B"]).unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_remove_all() {
        let mut set = letters();
        let (log, listener) = recorder();
        set.subscribe(listener);

        set.remove_all(["A", "B"]).unwrap();
        assert_eq!(log.borrow()[0].removed(), &["A", "B"]);
        assert!(!set.contains("A"));
    }

    #[test]
    fn test_ordered_set_clear_lists_sorted_contents() {
        let mut set = ObservableSet::btree_set();
        set.add_all([3, 1, 2]).unwrap();

        let (log, listener) = recorder();
        set.subscribe(listener);
        set.clear().unwrap();

        assert_eq!(log.borrow()[0].removed(), &[1, 2, 3]);
    }

    #[test]
    fn test_equality_and_hash_follow_delegate() {
        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let a = ObservableSet::new(BTreeSet::from(["A", "B"]));
        let b = ObservableSet::new(BTreeSet::from(["B", "A"]));

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a.container_id(), b.container_id());
        assert_eq!(letters(), letters());
    }

    #[test]
    fn test_debug_shows_label_and_listeners() {
        let mut set =
            ObservableSet::with_config(BTreeSet::from([1]), ObserveConfig::labeled("tags"));
        set.listen(|_| {});

        let debug = format!("{set:?}");
        assert!(debug.starts_with("ObservableSet"));
        assert!(debug.contains("tags"));
        assert!(debug.contains("listener_count: 1"));
    }

    #[test]
    fn test_observable_trait() {
        let mut set: ObservableSet<BTreeSet<u8>> = ObservableSet::btree_set();
        let (log, listener) = recorder();
        let id = set.add_listener(listener);

        set.add(1).unwrap();
        assert!(set.remove_listener(id));
        set.add(2).unwrap();

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(set.into_inner(), BTreeSet::from([1, 2]));
    }
}
