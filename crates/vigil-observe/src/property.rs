//! Coarse "property changed" notifications for observable containers.
//!
//! UI-style consumers often only care that a container changed, not how.
//! A [`PropertyChangeAdapter`] subscribed to a container turns every
//! [`Change`] into a [`PropertyChangeEvent`] naming a property and the
//! container, and fires it through a shared [`PropertyChangeSupport`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;
use vigil_core::{Change, ChangeListener, ContainerId, ListenerId, Observable};

/// A property of some owner changed.
///
/// The event never describes the change itself; listeners read the current
/// state from the container identified by `source`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyChangeEvent {
    property: String,
    source: ContainerId,
}

impl PropertyChangeEvent {
    /// Create a new event.
    pub fn new(property: impl Into<String>, source: ContainerId) -> Self {
        Self {
            property: property.into(),
            source,
        }
    }

    /// Name of the property that changed.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The container whose change triggered the event.
    pub fn source(&self) -> ContainerId {
        self.source
    }
}

/// Receives property change events.
pub trait PropertyChangeListener {
    /// Called for every event fired through the support the listener is
    /// registered with.
    fn property_changed(&self, event: &PropertyChangeEvent);
}

impl<F> PropertyChangeListener for F
where
    F: Fn(&PropertyChangeEvent),
{
    fn property_changed(&self, event: &PropertyChangeEvent) {
        self(event)
    }
}

/// A shared property listener handle.
pub type SharedPropertyListener = Rc<dyn PropertyChangeListener>;

/// Ordered fan-out of property change events.
///
/// Listeners are registered either for every property or for one named
/// property. Registration takes `&self` so the support can be shared with
/// any number of adapters through an `Rc`.
#[derive(Default)]
pub struct PropertyChangeSupport {
    listeners: RefCell<Vec<(Option<String>, SharedPropertyListener)>>,
}

impl PropertyChangeSupport {
    /// Create an empty support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every property.
    pub fn add_listener(&self, listener: SharedPropertyListener) {
        self.listeners.borrow_mut().push((None, listener));
    }

    /// Register a listener for one property.
    pub fn add_property_listener(&self, property: impl Into<String>, listener: SharedPropertyListener) {
        self.listeners
            .borrow_mut()
            .push((Some(property.into()), listener));
    }

    /// Unregister every registration of `listener`. Returns whether any was
    /// found.
    pub fn remove_listener(&self, listener: &SharedPropertyListener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(_, existing)| !Rc::ptr_eq(existing, listener));
        listeners.len() != before
    }

    /// Get listener count, over all properties.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether any listener would receive events for `property`.
    pub fn has_listeners(&self, property: &str) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|(filter, _)| filter.as_deref().is_none_or(|name| name == property))
    }

    /// Deliver `event` to every matching listener, in registration order.
    pub fn fire(&self, event: &PropertyChangeEvent) {
        // Snapshot so listeners may register others while being notified.
        let listeners: Vec<SharedPropertyListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(filter, _)| filter.as_deref().is_none_or(|name| name == event.property()))
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener.property_changed(event);
        }
    }
}

impl fmt::Debug for PropertyChangeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeSupport")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// A change listener that fires a fixed property change event.
pub struct PropertyChangeAdapter {
    support: Rc<PropertyChangeSupport>,
    event: PropertyChangeEvent,
}

impl PropertyChangeAdapter {
    /// Create an adapter firing `property` for changes of `source`.
    pub fn new(
        support: Rc<PropertyChangeSupport>,
        property: impl Into<String>,
        source: ContainerId,
    ) -> Self {
        Self {
            support,
            event: PropertyChangeEvent::new(property, source),
        }
    }

    /// The event fired for every change.
    pub fn event(&self) -> &PropertyChangeEvent {
        &self.event
    }
}

impl<T> ChangeListener<T> for PropertyChangeAdapter {
    fn on_change(&self, _change: &Change<T>) {
        self.support.fire(&self.event);
    }
}

impl fmt::Debug for PropertyChangeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangeAdapter")
            .field("event", &self.event)
            .finish()
    }
}

/// Make every change of `observable` fire `property` through `support`.
///
/// Returns the id of the subscribed adapter, so it can be removed again.
pub fn property_change_adapter<T, O>(
    support: &Rc<PropertyChangeSupport>,
    observable: &mut O,
    property: impl Into<String>,
) -> ListenerId
where
    O: Observable<T> + ?Sized,
{
    let adapter = PropertyChangeAdapter::new(
        Rc::clone(support),
        property,
        observable.container_id(),
    );
    debug!(
        source = %adapter.event.source(),
        property = adapter.event.property(),
        "Property change adapter attached"
    );
    observable.add_listener(Rc::new(adapter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use vigil_core::{ListenerRegistry, SharedListener};

    /// Minimal observable used to drive the adapter.
    struct Source {
        id: ContainerId,
        listeners: ListenerRegistry<u32>,
    }

    impl Source {
        fn new() -> Self {
            Self {
                id: ContainerId::new(),
                listeners: ListenerRegistry::new(),
            }
        }

        fn emit(&self) {
            self.listeners
                .dispatch(&Change::addition(self.id, vec![1]));
        }
    }

    impl Observable<u32> for Source {
        fn container_id(&self) -> ContainerId {
            self.id
        }

        fn add_listener(&mut self, listener: SharedListener<u32>) -> ListenerId {
            self.listeners.subscribe(listener)
        }

        fn remove_listener(&mut self, id: ListenerId) -> bool {
            self.listeners.unsubscribe(id)
        }
    }

    fn recording(log: &Rc<RefCell<Vec<PropertyChangeEvent>>>) -> SharedPropertyListener {
        let log = Rc::clone(log);
        Rc::new(move |event: &PropertyChangeEvent| log.borrow_mut().push(event.clone()))
    }

    #[test]
    fn test_adapter_fires_fixed_event() {
        let support = Rc::new(PropertyChangeSupport::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        support.add_listener(recording(&log));

        let mut source = Source::new();
        property_change_adapter(&support, &mut source, "items");

        source.emit();
        source.emit();

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].property(), "items");
        assert_eq!(log[0].source(), source.id);
        assert_eq!(log[0], log[1]);
    }

    #[test]
    fn test_adapter_can_be_removed() {
        let support = Rc::new(PropertyChangeSupport::new());
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        support.add_listener(Rc::new(move |_: &PropertyChangeEvent| {
            counter.set(counter.get() + 1)
        }));

        let mut source = Source::new();
        let id = property_change_adapter(&support, &mut source, "items");
        source.emit();
        assert!(source.remove_listener(id));
        source.emit();

        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_named_listeners_filter() {
        let support = PropertyChangeSupport::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        support.add_property_listener("prices", recording(&log));

        let id = ContainerId::new();
        support.fire(&PropertyChangeEvent::new("items", id));
        support.fire(&PropertyChangeEvent::new("prices", id));

        assert_eq!(log.borrow().len(), 1);
        assert!(support.has_listeners("prices"));
        assert!(!support.has_listeners("items"));
    }

    #[test]
    fn test_remove_listener() {
        let support = PropertyChangeSupport::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = recording(&log);

        support.add_listener(Rc::clone(&listener));
        support.add_property_listener("items", Rc::clone(&listener));
        assert_eq!(support.listener_count(), 2);

        assert!(support.remove_listener(&listener));
        assert!(!support.remove_listener(&listener));
        assert_eq!(support.listener_count(), 0);
    }
}
