//! Change counting.

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use vigil_core::{Change, ChangeListener};

/// Totals observed by a [`ChangeCounter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    /// Number of dispatched changes.
    pub changes: u64,
    /// Changes with `was_added` set.
    pub additions: u64,
    /// Changes with `was_removed` set.
    pub removals: u64,
    /// Changes with both flags set.
    pub updates: u64,
    /// Elements listed as added, summed over all changes.
    pub added_elements: u64,
    /// Elements listed as removed, summed over all changes.
    pub removed_elements: u64,
}

impl ChangeStats {
    /// Get a one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "{} changes ({} additions, {} removals, {} updates), +{} -{} elements",
            self.changes,
            self.additions,
            self.removals,
            self.updates,
            self.added_elements,
            self.removed_elements
        )
    }
}

/// A listener that counts what it sees.
#[derive(Debug, Default)]
pub struct ChangeCounter {
    stats: Cell<ChangeStats>,
}

impl ChangeCounter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current totals.
    pub fn stats(&self) -> ChangeStats {
        self.stats.get()
    }

    /// Reset all totals to zero.
    pub fn reset(&self) {
        self.stats.set(ChangeStats::default());
    }
}

impl<T> ChangeListener<T> for ChangeCounter {
    fn on_change(&self, change: &Change<T>) {
        let mut stats = self.stats.get();
        stats.changes += 1;
        stats.added_elements += change.added().len() as u64;
        stats.removed_elements += change.removed().len() as u64;
        if change.was_added() {
            stats.additions += 1;
        }
        if change.was_removed() {
            stats.removals += 1;
        }
        if change.is_update() {
            stats.updates += 1;
        }
        self.stats.set(stats);
    }
}
