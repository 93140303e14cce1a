//! Configuration for observable wrappers.

use serde::{Deserialize, Serialize};

/// Configuration shared by every observable wrapper.
///
/// None of these settings change which changes are dispatched; they only
/// affect how the wrapper reports itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    /// Human-readable name used in log records and `Debug` output.
    pub label: Option<String>,

    /// Emit a `trace` record for every dispatched change.
    ///
    /// Defaults to true; disable for hot containers where even a filtered-out
    /// trace call is unwanted.
    pub trace_dispatch: bool,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            label: None,
            trace_dispatch: true,
        }
    }
}

impl ObserveConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable per-change trace records.
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// A labeled configuration.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self::default().with_label(label)
    }

    /// A configuration that never traces dispatch.
    pub fn quiet() -> Self {
        Self {
            label: None,
            trace_dispatch: false,
        }
    }

    /// Label as a string slice, empty when unset.
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// Configuration for a view derived from a container with this config.
    ///
    /// The label gains a `.{suffix}` component; an unlabeled parent yields an
    /// unlabeled view.
    pub fn derive(&self, suffix: &str) -> Self {
        Self {
            label: self.label.as_ref().map(|label| format!("{label}.{suffix}")),
            trace_dispatch: self.trace_dispatch,
        }
    }
}
