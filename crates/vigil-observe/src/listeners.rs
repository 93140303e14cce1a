//! Ready-made change listeners.

use std::cell::RefCell;
use std::fmt;

use tracing::Level;
use vigil_core::{Change, ChangeListener};

/// A listener that logs every change through `tracing`.
pub struct LoggingListener {
    /// Level the records are emitted at.
    pub log_level: Level,
    /// Optional name included in every record.
    pub label: Option<String>,
}

impl LoggingListener {
    /// Create a new logging listener.
    pub fn new() -> Self {
        Self {
            log_level: Level::DEBUG,
            label: None,
        }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> ChangeListener<T> for LoggingListener {
    fn on_change(&self, change: &Change<T>) {
        let label = self.label.as_deref().unwrap_or("");

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    source = %change.source(),
                    label = label,
                    added = ?change.added(),
                    removed = ?change.removed(),
                    was_added = change.was_added(),
                    was_removed = change.was_removed(),
                    "Container changed"
                )
            };
        }

        match self.log_level {
            Level::ERROR => emit!(Level::ERROR),
            Level::WARN => emit!(Level::WARN),
            Level::INFO => emit!(Level::INFO),
            Level::DEBUG => emit!(Level::DEBUG),
            _ => emit!(Level::TRACE),
        }
    }
}

/// A listener that collects changes for later inspection.
pub struct CollectingListener<T> {
    changes: RefCell<Vec<Change<T>>>,
    max_changes: usize,
}

impl<T: Clone> CollectingListener<T> {
    /// Create a listener that keeps at most `max_changes` changes.
    pub fn new(max_changes: usize) -> Self {
        Self {
            changes: RefCell::new(Vec::new()),
            max_changes,
        }
    }

    /// Get collected changes.
    pub fn changes(&self) -> Vec<Change<T>> {
        self.changes.borrow().clone()
    }

    /// Get the most recent change.
    pub fn last(&self) -> Option<Change<T>> {
        self.changes.borrow().last().cloned()
    }

    /// Clear collected changes.
    pub fn clear(&self) {
        self.changes.borrow_mut().clear();
    }

    /// Get change count.
    pub fn len(&self) -> usize {
        self.changes.borrow().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.changes.borrow().is_empty()
    }
}

impl<T: Clone> ChangeListener<T> for CollectingListener<T> {
    fn on_change(&self, change: &Change<T>) {
        let mut changes = self.changes.borrow_mut();
        if changes.len() < self.max_changes {
            changes.push(change.clone());
        }
    }
}

impl<T> fmt::Debug for CollectingListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingListener")
            .field("collected", &self.changes.borrow().len())
            .field("max_changes", &self.max_changes)
            .finish()
    }
}
