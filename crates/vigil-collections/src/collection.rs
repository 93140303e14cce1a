//! Observable wrapper over any [`Collection`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use tracing::{debug, trace};
use vigil_core::{
    Change, CollectionResult, ContainerId, ListenerId, ListenerRegistry, MutationKind, Observable,
    ObserveConfig, SharedListener,
};

use crate::bridge::{Bridge, Direct};
use crate::cursor::Cursor;
use crate::delegate::Collection;

/// A collection that notifies its listeners after every effective mutation.
///
/// Reads go straight to the delegate through `Deref`. Mutations must go
/// through the wrapper's own methods, which forward to the delegate and then
/// dispatch one [`Change`] if the delegate reports that it changed.
///
/// Equality and hashing are those of the delegate; the container id, the
/// listeners and the configuration are not compared.
pub struct ObservableCollection<D: Collection, B = Direct> {
    delegate: D,
    listeners: ListenerRegistry<D::Item>,
    id: ContainerId,
    config: ObserveConfig,
    bridge: B,
}

impl<D: Collection> ObservableCollection<D> {
    /// Wrap `delegate` with the default configuration.
    pub fn new(delegate: D) -> Self {
        Self::with_config(delegate, ObserveConfig::default())
    }

    /// Wrap `delegate` with a custom configuration.
    pub fn with_config(delegate: D, config: ObserveConfig) -> Self {
        Self::with_bridge(delegate, Direct, config)
    }
}

impl<D: Collection, B: Bridge<D>> ObservableCollection<D, B> {
    /// Wrap `delegate`, routing every mutation through `bridge`.
    pub fn with_bridge(delegate: D, bridge: B, config: ObserveConfig) -> Self {
        let id = ContainerId::new();
        debug!(container = %id, label = config.label_str(), "Observable collection created");

        Self {
            delegate,
            listeners: ListenerRegistry::new(),
            id,
            config,
            bridge,
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
    pub fn get_ref(&self) -> &D {
        &self.delegate
    }

    /// Unwrap the delegate. Listeners are dropped.
    pub fn into_inner(self) -> D {
        self.delegate
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: SharedListener<D::Item>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Register a closure as a listener.
    pub fn listen<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&Change<D::Item>) + 'static,
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

    /// Add one element.
    ///
    /// Dispatches an addition of exactly `[item]` when the delegate changed.
    pub fn add(&mut self, item: D::Item) -> CollectionResult<bool> {
        self.bridge.admit(MutationKind::Add)?;
        let snapshot = self.bridge.prepare(&self.delegate)?;

        if !self.delegate.add(item.clone())? {
            return Ok(false);
        }
        self.fire(snapshot, Change::addition(self.id, vec![item]));
        Ok(true)
    }

    /// Remove one element.
    ///
    /// Dispatches a removal of exactly `[item]` when the delegate changed.
    pub fn remove(&mut self, item: &D::Item) -> CollectionResult<bool> {
        self.bridge.admit(MutationKind::Remove)?;
        let snapshot = self.bridge.prepare(&self.delegate)?;

        if !self.delegate.remove(item)? {
            return Ok(false);
        }
        self.fire(snapshot, Change::removal(self.id, vec![item.clone()]));
        Ok(true)
    }

    /// Add every element of `items`.
    ///
    /// Dispatches one addition listing `items` as given, including elements
    /// a set already held.
    pub fn add_all<I>(&mut self, items: I) -> CollectionResult<bool>
    where
        I: IntoIterator<Item = D::Item>,
    {
        self.bridge.admit(MutationKind::AddAll)?;
        let items: Vec<D::Item> = items.into_iter().collect();
        let snapshot = self.bridge.prepare(&self.delegate)?;

        if !self.delegate.add_all(&items)? {
            return Ok(false);
        }
        self.fire(snapshot, Change::addition(self.id, items));
        Ok(true)
    }

    /// Remove every occurrence of every element of `items`.
    ///
    /// Dispatches one removal listing `items` as given, including elements
    /// that were absent.
    pub fn remove_all<I>(&mut self, items: I) -> CollectionResult<bool>
    where
        I: IntoIterator<Item = D::Item>,
    {
        self.bridge.admit(MutationKind::RemoveAll)?;
        let items: Vec<D::Item> = items.into_iter().collect();
        let snapshot = self.bridge.prepare(&self.delegate)?;

        if !self.delegate.remove_all(&items)? {
            return Ok(false);
        }
        self.fire(snapshot, Change::removal(self.id, items));
        Ok(true)
    }

    /// Keep only elements contained in `items`.
    ///
    /// Dispatches one removal listing the elements that were dropped, in
    /// their previous iteration order.
    pub fn retain_all<I>(&mut self, items: I) -> CollectionResult<bool>
    where
        I: IntoIterator<Item = D::Item>,
    {
        self.bridge.admit(MutationKind::RetainAll)?;
        let keep: Vec<D::Item> = items.into_iter().collect();
        let snapshot = self.bridge.prepare(&self.delegate)?;
        let before = self.delegate.try_snapshot()?;

        if !self.delegate.retain_all(&keep)? {
            return Ok(false);
        }
        let removed = before
            .into_iter()
            .filter(|item| !keep.contains(item))
            .collect();
        self.fire(snapshot, Change::removal(self.id, removed));
        Ok(true)
    }

    /// Keep only elements for which `keep` returns true.
    ///
    /// Dispatches one removal listing the dropped elements.
    pub fn retain<F>(&mut self, mut keep: F) -> CollectionResult<bool>
    where
        F: FnMut(&D::Item) -> bool,
    {
        self.bridge.admit(MutationKind::Retain)?;
        let snapshot = self.bridge.prepare(&self.delegate)?;

        let mut removed = Vec::new();
        let mut position = 0;
        for item in self.delegate.try_snapshot()? {
            if !keep(&item) && self.delegate.remove_at(position, &item)? {
                removed.push(item);
            } else {
                position += 1;
            }
        }

        if removed.is_empty() {
            return Ok(false);
        }
        self.fire(snapshot, Change::removal(self.id, removed));
        Ok(true)
    }

    /// Remove every element.
    ///
    /// Dispatches a removal of the previous contents unless the collection
    /// was already empty.
    pub fn clear(&mut self) -> CollectionResult<()> {
        self.bridge.admit(MutationKind::Clear)?;
        let snapshot = self.bridge.prepare(&self.delegate)?;
        let before = self.delegate.try_snapshot()?;

        self.delegate.clear()?;
        if before.is_empty() {
            return Ok(());
        }
        self.fire(snapshot, Change::removal(self.id, before));
        Ok(())
    }

    /// Iterate with the ability to remove the element just yielded.
    ///
    /// The cursor reads the delegate once, up front, so it panics on a shared
    /// delegate that is mutably borrowed elsewhere.
    pub fn cursor(&mut self) -> Cursor<'_, D, B> {
        Cursor::new(self)
    }

    /// Remove the element a cursor yielded at live position `position`.
    pub(crate) fn remove_yielded(
        &mut self,
        position: usize,
        item: &D::Item,
    ) -> CollectionResult<bool> {
        self.bridge.admit(MutationKind::CursorRemove)?;
        let snapshot = self.bridge.prepare(&self.delegate)?;

        if !self.delegate.remove_at(position, item)? {
            return Ok(false);
        }
        self.fire(snapshot, Change::removal(self.id, vec![item.clone()]));
        Ok(true)
    }

    fn fire(&self, snapshot: B::Snapshot, change: Change<D::Item>) {
        if self.config.trace_dispatch {
            trace!(
                container = %self.id,
                label = self.config.label_str(),
                added = change.added().len(),
                removed = change.removed().len(),
                listeners = self.listeners.len(),
                "Dispatching change"
            );
        }
        self.bridge.forward(snapshot, &change);
        self.listeners.dispatch(&change);
    }
}

impl<D: Collection, B> Deref for ObservableCollection<D, B> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.delegate
    }
}

impl<D: Collection + PartialEq, B> PartialEq for ObservableCollection<D, B> {
    fn eq(&self, other: &Self) -> bool {
        self.delegate == other.delegate
    }
}

impl<D: Collection + Eq, B> Eq for ObservableCollection<D, B> {}

impl<D: Collection + Hash, B> Hash for ObservableCollection<D, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.delegate.hash(state);
    }
}

impl<D: Collection + fmt::Debug, B> fmt::Debug for ObservableCollection<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCollection")
            .field("label", &self.config.label)
            .field("delegate", &self.delegate)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl<D: Collection, B: Bridge<D>> Observable<D::Item> for ObservableCollection<D, B> {
    fn container_id(&self) -> ContainerId {
        self.id
    }

    fn add_listener(&mut self, listener: SharedListener<D::Item>) -> ListenerId {
        self.subscribe(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recorder;
    use std::cell::RefCell;
    use std::collections::HashSet;

    fn letters() -> ObservableCollection<Vec<&'static str>> {
        ObservableCollection::new(vec!["A", "B", "C", "D", "E", "F"])
    }

    #[test]
    fn test_add_dispatches_single_element() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        assert!(list.add("G").unwrap());

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert!(log[0].was_added());
        assert!(!log[0].was_removed());
        assert_eq!(log[0].added(), &["G"]);
        assert_eq!(log[0].source(), list.id());
        assert_eq!(list.len(), 7);
    }

    #[test]
    fn test_add_all_dispatches_once() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        list.add_all(["G", "H"]).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].added(), &["G", "H"]);
    }

    #[test]
    fn test_empty_add_all_is_silent() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        assert!(!list.add_all(Vec::new()).unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        assert!(!list.remove(&"Z").unwrap());
        assert!(log.borrow().is_empty());

        assert!(list.remove(&"C").unwrap());
        assert_eq!(log.borrow()[0].removed(), &["C"]);
    }

    #[test]
    fn test_remove_all_lists_arguments() {
        let mut list = ObservableCollection::new(vec!["A", "B", "A", "C"]);
        let (log, listener) = recorder();
        list.subscribe(listener);

        list.remove_all(["A", "B", "Z"]).unwrap();

        assert_eq!(*list, vec!["C"]);
        assert_eq!(log.borrow()[0].removed(), &["A", "B", "Z"]);
    }

    #[test]
    fn test_retain_all_lists_dropped_elements() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        list.retain_all(["B", "D"]).unwrap();

        assert_eq!(*list, vec!["B", "D"]);
        assert_eq!(log.borrow()[0].removed(), &["A", "C", "E", "F"]);
    }

    #[test]
    fn test_retain_all_keeping_everything_is_silent() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        assert!(!list.retain_all(["A", "B", "C", "D", "E", "F"]).unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_retain_predicate() {
        let mut list = ObservableCollection::new(vec![1, 2, 3, 4, 5, 6]);
        let (log, listener) = recorder();
        list.subscribe(listener);

        assert!(list.retain(|n| n % 2 == 0).unwrap());
        assert_eq!(*list, vec![2, 4, 6]);
        assert_eq!(log.borrow()[0].removed(), &[1, 3, 5]);

        assert!(!list.retain(|_| true).unwrap());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut list = letters();
        let (log, listener) = recorder();
        list.subscribe(listener);

        list.clear().unwrap();
        list.clear().unwrap();

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].removed(), &["A", "B", "C", "D", "E", "F"]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_listeners_run_in_order() {
        let mut list = letters();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ['A', 'B', 'C'] {
            let order = Rc::clone(&order);
            list.listen(move |_| order.borrow_mut().push(tag));
        }

        list.add("G").unwrap();
        assert_eq!(*order.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn test_unsubscribed_listener_is_not_called() {
        let mut list = letters();
        let (log, listener) = recorder();
        let id = list.subscribe(listener);

        assert!(list.unsubscribe(id));
        list.add("G").unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(list.listener_count(), 0);
    }

    #[test]
    fn test_equality_ignores_identity() {
        let a = ObservableCollection::new(vec![1, 2]);
        let mut b = ObservableCollection::new(vec![1, 2]);
        b.listen(|_| {});

        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_delegate_skips_duplicates() {
        let mut set = ObservableCollection::new(HashSet::from(["A"]));
        let (log, listener) = recorder();
        set.subscribe(listener);

        assert!(!set.add("A").unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_borrowed_delegate_writes_through() {
        let mut items = vec!["A"];
        {
            let mut list = ObservableCollection::new(&mut items);
            list.add("B").unwrap();
        }
        assert_eq!(items, vec!["A", "B"]);
    }

    #[test]
    fn test_shared_delegate_bypass_is_silent() {
        let shared = Rc::new(RefCell::new(vec!["A"]));
        let mut list = ObservableCollection::new(Rc::clone(&shared));
        let (log, listener) = recorder();
        list.subscribe(listener);

        shared.borrow_mut().push("B");
        assert_eq!(list.size(), 2);
        assert!(log.borrow().is_empty());

        list.add("C").unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_conflicting_borrow_is_returned_without_dispatch() {
        let shared = Rc::new(RefCell::new(vec!["A", "B"]));
        let mut list = ObservableCollection::new(Rc::clone(&shared));
        let (log, listener) = recorder();
        list.subscribe(listener);

        let guard = shared.borrow_mut();
        assert!(list.add("C").unwrap_err().is_delegate());
        assert!(list.remove(&"A").unwrap_err().is_delegate());
        assert!(list.add_all(["C"]).unwrap_err().is_delegate());
        assert!(list.remove_all(["A"]).unwrap_err().is_delegate());
        assert!(list.retain_all(["A"]).unwrap_err().is_delegate());
        assert!(list.retain(|_| false).unwrap_err().is_delegate());
        assert!(list.clear().unwrap_err().is_delegate());
        drop(guard);

        assert!(log.borrow().is_empty());
        assert_eq!(*shared.borrow(), vec!["A", "B"]);

        list.clear().unwrap();
        assert_eq!(log.borrow()[0].removed(), &["A", "B"]);
    }

    #[test]
    fn test_debug_shows_label() {
        let list = ObservableCollection::with_config(vec![1], ObserveConfig::labeled("todo"));
        let debug = format!("{list:?}");
        assert!(debug.contains("todo"));
        assert!(debug.contains("listener_count"));
    }
}
