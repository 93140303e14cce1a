//! Vigil Core
//!
//! This crate provides the building blocks shared by every Vigil observable
//! container:
//!
//! - [`Change`]: the immutable notification dispatched after a mutation
//! - [`ListenerRegistry`]: ordered, synchronous listener fan-out
//! - [`Observable`]: the subscription surface every wrapper implements
//! - [`CollectionError`]: the error taxonomy
//! - [`ObserveConfig`]: wrapper configuration
//!
//! # Dispatch Model
//!
//! Observation is single-threaded and synchronous. A mutating call applies
//! the change to the delegate, builds a [`Change`], and invokes every
//! listener in registration order before returning. There is no queue and no
//! background thread.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use vigil_core::{Change, ContainerId, ListenerRegistry};
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//!
//! let mut registry = ListenerRegistry::new();
//! registry.subscribe(Rc::new(move |_: &Change<&str>| counter.set(counter.get() + 1)));
//!
//! registry.dispatch(&Change::addition(ContainerId::new(), vec!["G"]));
//! assert_eq!(seen.get(), 1);
//! ```

pub mod change;
pub mod config;
pub mod error;
pub mod listener;

// Re-export main types at crate root
pub use change::{Change, ContainerId, MapChange};
pub use config::ObserveConfig;
pub use error::{CollectionError, CollectionResult, MutationKind, ViewKind};
pub use listener::{ChangeListener, ListenerId, ListenerRegistry, Observable, SharedListener};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::change::{Change, ContainerId, MapChange};
    pub use crate::config::ObserveConfig;
    pub use crate::error::{CollectionError, CollectionResult};
    pub use crate::listener::{ChangeListener, ListenerId, Observable, SharedListener};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _ = ContainerId::new();
        let _ = ObserveConfig::default();
    }
}
