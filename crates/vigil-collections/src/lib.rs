//! Vigil Collections
//!
//! Observable wrappers around ordinary containers:
//!
//! - [`ObservableCollection`]: any [`Collection`] (sequences, sets, deques)
//! - [`ObservableSet`]: a collection whose delegate holds no duplicates
//! - [`ObservableMap`]: any [`Mapping`], with live key, value and entry views
//!
//! Every wrapper owns a *delegate handle*. Pass the container by value to let
//! the wrapper own it, `&mut` to wrap a container you keep, or
//! `Rc<RefCell<..>>` to share it. Mutating the delegate through another
//! handle bypasses notification.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use vigil_collections::ObservableMap;
//! use vigil_core::MapChange;
//!
//! let removed = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&removed);
//!
//! let mut prices = ObservableMap::btree_map();
//! prices.put("apple", 3).unwrap();
//! prices.listen(move |change: &MapChange<&str, i32>| {
//!     log.borrow_mut().extend(change.removed().iter().cloned());
//! });
//!
//! prices.key_set().remove(&"apple").unwrap();
//! assert_eq!(*removed.borrow(), vec![("apple", 3)]);
//! ```

pub mod bridge;
pub mod collection;
pub mod cursor;
pub mod delegate;
pub mod map;
pub mod mapping;
pub mod set;
pub mod views;

// Re-export main types at crate root
pub use bridge::{Bridge, Direct};
pub use collection::ObservableCollection;
pub use cursor::Cursor;
pub use delegate::{Collection, SetCollection};
pub use map::ObservableMap;
pub use mapping::Mapping;
pub use set::ObservableSet;
pub use views::{
    EntryBridge, EntryView, Entries, KeyBridge, KeyView, Keys, ValueBridge, ValueView, Values,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::collection::ObservableCollection;
    pub use crate::delegate::{Collection, SetCollection};
    pub use crate::map::ObservableMap;
    pub use crate::mapping::Mapping;
    pub use crate::set::ObservableSet;
    pub use crate::views::{EntryView, KeyView, ValueView};
}
