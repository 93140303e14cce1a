//! Listener registration and synchronous dispatch.
//!
//! Dispatch runs on the mutating call's own stack: every listener is invoked
//! in registration order before the mutation returns. A listener cannot
//! mutate the container that is notifying it. With owned or `&mut` delegates
//! the borrow checker rules it out; with a wrapper shared through
//! `Rc<RefCell<..>>` the nested borrow panics. Re-entrant mutation is
//! unsupported either way.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::change::{Change, ContainerId};

/// Receives changes from an observable container.
pub trait ChangeListener<T> {
    /// Called after a mutation has been applied to the delegate.
    fn on_change(&self, change: &Change<T>);
}

impl<T, F> ChangeListener<T> for F
where
    F: Fn(&Change<T>),
{
    fn on_change(&self, change: &Change<T>) {
        self(change)
    }
}

/// A shared listener handle.
pub type SharedListener<T> = Rc<dyn ChangeListener<T>>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Ordered set of listeners owned by one wrapper.
pub struct ListenerRegistry<T> {
    listeners: Vec<(ListenerId, SharedListener<T>)>,
    next_id: u64,
}

impl<T> ListenerRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Add a listener. It is notified after every listener added before it.
    pub fn subscribe(&mut self, listener: SharedListener<T>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        debug!(listener = %id, count = self.listeners.len(), "Listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        let removed = self.listeners.len() != before;
        if removed {
            debug!(listener = %id, count = self.listeners.len(), "Listener unsubscribed");
        }
        removed
    }

    /// Remove all listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Get listener count.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invoke every listener, in registration order.
    pub fn dispatch(&self, change: &Change<T>) {
        for (_, listener) in &self.listeners {
            listener.on_change(change);
        }
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

/// Something that dispatches [`Change`]s to subscribed listeners.
///
/// Implemented by every observable wrapper, so helpers such as the
/// property-change bridge can attach to any of them.
pub trait Observable<T> {
    /// The id carried by changes dispatched to this container's listeners.
    fn container_id(&self) -> ContainerId;

    /// Add a listener.
    fn add_listener(&mut self, listener: SharedListener<T>) -> ListenerId;

    /// Remove a listener.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}
