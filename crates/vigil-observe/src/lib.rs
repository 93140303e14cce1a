//! Vigil Observe
//!
//! Listeners that plug into any Vigil container:
//!
//! - [`LoggingListener`]: structured `tracing` record per change
//! - [`CollectingListener`]: bounded in-memory change log
//! - [`ChangeCounter`]: running totals, snapshotted as [`ChangeStats`]
//! - [`PropertyChangeAdapter`]: coarse property change events for UI glue

pub mod listeners;
pub mod property;
pub mod stats;

// Re-export main types at crate root
pub use listeners::{CollectingListener, LoggingListener};
pub use property::{
    PropertyChangeAdapter, PropertyChangeEvent, PropertyChangeListener, PropertyChangeSupport,
    SharedPropertyListener, property_change_adapter,
};
pub use stats::{ChangeCounter, ChangeStats};
