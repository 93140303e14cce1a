//! Replay scripts.
//!
//! A script describes one container and a list of steps to apply to it:
//!
//! ```toml
//! [container]
//! kind = "map"
//! entries = [["1", "A"], ["2", "B"]]
//!
//! [observe]
//! label = "prices"
//!
//! [[step]]
//! op = "put"
//! key = "2"
//! value = "BB"
//!
//! [[step]]
//! op = "keys_remove"
//! key = "1"
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vigil::prelude::ObserveConfig;

/// The container a script operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A `Vec<String>`.
    List,
    /// A `BTreeSet<String>`.
    Set,
    /// A `BTreeMap<String, String>`.
    Map,
}

impl ContainerKind {
    /// Get the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::Set => "set",
            ContainerKind::Map => "map",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initial container contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container kind.
    pub kind: ContainerKind,
    /// Initial elements of a list or set.
    #[serde(default)]
    pub elements: Vec<String>,
    /// Initial entries of a map.
    #[serde(default)]
    pub entries: Vec<(String, String)>,
}

/// One operation of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Add one element.
    Add { element: String },
    /// Remove one element.
    Remove { element: String },
    /// Add several elements.
    AddAll { elements: Vec<String> },
    /// Remove several elements.
    RemoveAll { elements: Vec<String> },
    /// Keep only the listed elements.
    RetainAll { elements: Vec<String> },
    /// Remove the listed elements while iterating with a cursor.
    CursorRemove { elements: Vec<String> },
    /// Remove everything.
    Clear,
    /// Bind a key.
    Put { key: String, value: String },
    /// Bind several keys.
    PutAll { entries: Vec<(String, String)> },
    /// Unbind a key.
    RemoveKey { key: String },
    /// Remove a key through the key view.
    KeysRemove { key: String },
    /// Add a key through the key view.
    KeysAdd { key: String },
    /// Keep only the listed keys, through the key view.
    KeysRetainAll { keys: Vec<String> },
    /// Clear through the key view.
    KeysClear,
    /// Remove a value through the value view.
    ValuesRemove { value: String },
    /// Clear through the value view.
    ValuesClear,
    /// Remove a pair through the entry view.
    EntriesRemove { key: String, value: String },
    /// Add a pair through the entry view.
    EntriesAdd { key: String, value: String },
    /// Keep only the listed pairs, through the entry view.
    EntriesRetainAll { entries: Vec<(String, String)> },
}

impl Step {
    /// Get the operation name, as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Add { .. } => "add",
            Step::Remove { .. } => "remove",
            Step::AddAll { .. } => "add_all",
            Step::RemoveAll { .. } => "remove_all",
            Step::RetainAll { .. } => "retain_all",
            Step::CursorRemove { .. } => "cursor_remove",
            Step::Clear => "clear",
            Step::Put { .. } => "put",
            Step::PutAll { .. } => "put_all",
            Step::RemoveKey { .. } => "remove_key",
            Step::KeysRemove { .. } => "keys_remove",
            Step::KeysAdd { .. } => "keys_add",
            Step::KeysRetainAll { .. } => "keys_retain_all",
            Step::KeysClear => "keys_clear",
            Step::ValuesRemove { .. } => "values_remove",
            Step::ValuesClear => "values_clear",
            Step::EntriesRemove { .. } => "entries_remove",
            Step::EntriesAdd { .. } => "entries_add",
            Step::EntriesRetainAll { .. } => "entries_retain_all",
        }
    }

    /// Whether the step can be applied to a container of `kind` at all.
    pub fn applies_to(&self, kind: ContainerKind) -> bool {
        match self {
            Step::Clear => true,
            Step::Add { .. }
            | Step::Remove { .. }
            | Step::AddAll { .. }
            | Step::RemoveAll { .. }
            | Step::RetainAll { .. }
            | Step::CursorRemove { .. } => kind != ContainerKind::Map,
            _ => kind == ContainerKind::Map,
        }
    }

    /// Whether the step targets a view that rejects it unconditionally.
    pub fn always_rejected(&self) -> bool {
        matches!(
            self,
            Step::KeysAdd { .. }
                | Step::EntriesAdd { .. }
                | Step::ValuesRemove { .. }
                | Step::ValuesClear
        )
    }
}

/// A parsed replay script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// The container to build.
    pub container: ContainerSpec,
    /// Configuration of the container.
    #[serde(default)]
    pub observe: Option<ObserveConfig>,
    /// Steps, in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse script")
    }

    /// Load a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid script: {}", path.display()))
    }

    /// Resolve the container configuration.
    ///
    /// The script's own `[observe]` table wins over `fallback`. Without a
    /// label, the container is named after `name`.
    pub fn observe_config(&self, fallback: Option<ObserveConfig>, name: &str) -> ObserveConfig {
        let mut config = self
            .observe
            .clone()
            .or(fallback)
            .unwrap_or_default();
        if config.label.is_none() {
            config.label = Some(name.to_string());
        }
        config
    }
}

/// Load an observe configuration file.
pub fn load_config(path: &Path) -> Result<ObserveConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_SCRIPT: &str = r#"
        [container]
        kind = "map"
        entries = [["1", "A"], ["2", "B"]]

        [observe]
        label = "prices"

        [[step]]
        op = "put"
        key = "2"
        value = "BB"

        [[step]]
        op = "keys_remove"
        key = "1"

        [[step]]
        op = "clear"
    "#;

    #[test]
    fn test_parse_map_script() {
        let script = Script::parse(MAP_SCRIPT).unwrap();

        assert_eq!(script.container.kind, ContainerKind::Map);
        assert_eq!(script.container.entries.len(), 2);
        assert_eq!(script.steps.len(), 3);
        assert_eq!(
            script.steps[0],
            Step::Put {
                key: "2".to_string(),
                value: "BB".to_string()
            }
        );
        assert_eq!(script.steps[2], Step::Clear);
        assert_eq!(script.observe.unwrap().label.as_deref(), Some("prices"));
    }

    #[test]
    fn test_applicability() {
        let add = Step::Add {
            element: "G".to_string(),
        };
        assert!(add.applies_to(ContainerKind::List));
        assert!(add.applies_to(ContainerKind::Set));
        assert!(!add.applies_to(ContainerKind::Map));

        assert!(Step::KeysClear.applies_to(ContainerKind::Map));
        assert!(!Step::KeysClear.applies_to(ContainerKind::List));
        assert!(Step::Clear.applies_to(ContainerKind::Set));

        assert!(Step::ValuesClear.always_rejected());
        assert!(!Step::KeysClear.always_rejected());
    }

    #[test]
    fn test_observe_config_resolution() {
        let script = Script::parse("[container]\nkind = \"list\"\n").unwrap();
        assert!(script.steps.is_empty());

        let config = script.observe_config(None, "todo");
        assert_eq!(config.label.as_deref(), Some("todo"));

        let fallback = ObserveConfig::labeled("base").with_trace_dispatch(false);
        let config = script.observe_config(Some(fallback), "todo");
        assert_eq!(config.label.as_deref(), Some("base"));
        assert!(!config.trace_dispatch);
    }

    #[test]
    fn test_unknown_op_is_an_error() {
        let text = "[container]\nkind = \"set\"\n\n[[step]]\nop = \"explode\"\n";
        assert!(Script::parse(text).is_err());
    }
}
