//! Replay command - Apply a script to a fresh container.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Level, debug, info, warn};

use vigil::prelude::*;
use vigil::vigil_collections::Bridge;

use crate::OutputFormat;
use crate::script::{ContainerKind, Script, Step, load_config};

/// Changes kept per step; a step dispatches at most a handful.
const MAX_CHANGES_PER_STEP: usize = 1024;

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Path to the script (TOML)
    #[arg(required = true)]
    pub script: PathBuf,

    /// Stop at the first rejected step
    #[arg(long)]
    pub fail_fast: bool,
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step ran; it may or may not have dispatched changes.
    Applied,
    /// The container refused the step.
    Rejected,
    /// The step does not apply to this kind of container.
    Skipped,
}

/// Report of one step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    index: usize,
    op: &'static str,
    status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    changes: Vec<Value>,
}

/// Report of a whole replay.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    script: String,
    kind: ContainerKind,
    label: Option<String>,
    steps: Vec<StepReport>,
    contents: Value,
    stats: ChangeStats,
}

impl ReplayReport {
    fn rejected(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Rejected)
            .count()
    }
}

/// A step could not be applied.
enum StepFailure {
    Rejected(CollectionError),
    NotApplicable,
}

impl From<CollectionError> for StepFailure {
    fn from(err: CollectionError) -> Self {
        StepFailure::Rejected(err)
    }
}

type StepResult = std::result::Result<(), StepFailure>;

/// The container under replay, with the collector recording its changes.
enum Target {
    List(
        ObservableCollection<Vec<String>>,
        Rc<CollectingListener<String>>,
    ),
    Set(
        ObservableSet<BTreeSet<String>>,
        Rc<CollectingListener<String>>,
    ),
    Map(
        ObservableMap<BTreeMap<String, String>>,
        Rc<CollectingListener<(String, String)>>,
    ),
}

impl Target {
    fn build(script: &Script, vigil: &Vigil) -> Self {
        let container = &script.container;
        match container.kind {
            ContainerKind::List => {
                let mut list = vigil.list(container.elements.clone());
                let collector = Rc::new(CollectingListener::new(MAX_CHANGES_PER_STEP));
                list.subscribe(Rc::clone(&collector) as SharedListener<String>);
                Target::List(list, collector)
            }
            ContainerKind::Set => {
                let elements = container.elements.iter().cloned().collect::<BTreeSet<_>>();
                let mut set = vigil.set(elements);
                let collector = Rc::new(CollectingListener::new(MAX_CHANGES_PER_STEP));
                set.subscribe(Rc::clone(&collector) as SharedListener<String>);
                Target::Set(set, collector)
            }
            ContainerKind::Map => {
                let entries = container.entries.iter().cloned().collect::<BTreeMap<_, _>>();
                let mut map = vigil.map(entries);
                let collector = Rc::new(CollectingListener::new(MAX_CHANGES_PER_STEP));
                map.subscribe(Rc::clone(&collector) as SharedListener<(String, String)>);
                Target::Map(map, collector)
            }
        }
    }

    fn apply(&mut self, step: &Step) -> StepResult {
        match self {
            Target::List(list, _) => apply_collection(list, step),
            Target::Set(set, _) => apply_collection(&mut **set, step),
            Target::Map(map, _) => apply_map(map, step),
        }
    }

    /// Take the changes dispatched since the last call.
    fn drain(&self) -> Vec<Value> {
        match self {
            Target::List(_, collector) | Target::Set(_, collector) => {
                let changes = collector
                    .changes()
                    .iter()
                    .map(|change| change_json(change, |item| json!(item)))
                    .collect();
                collector.clear();
                changes
            }
            Target::Map(_, collector) => {
                let changes = collector
                    .changes()
                    .iter()
                    .map(|change| change_json(change, |(key, value)| json!({ key: value })))
                    .collect();
                collector.clear();
                changes
            }
        }
    }

    fn contents(&self) -> Value {
        match self {
            Target::List(list, _) => json!(list.get_ref()),
            Target::Set(set, _) => json!(set.get_ref()),
            Target::Map(map, _) => json!(map.get_ref()),
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            Target::List(list, _) => list.label().map(String::from),
            Target::Set(set, _) => set.label().map(String::from),
            Target::Map(map, _) => map.label().map(String::from),
        }
    }
}

fn change_json<T>(change: &Change<T>, item: impl Fn(&T) -> Value) -> Value {
    json!({
        "was_added": change.was_added(),
        "was_removed": change.was_removed(),
        "added": change.added().iter().map(&item).collect::<Vec<_>>(),
        "removed": change.removed().iter().map(&item).collect::<Vec<_>>(),
    })
}

fn apply_collection<D, B>(collection: &mut ObservableCollection<D, B>, step: &Step) -> StepResult
where
    D: Collection<Item = String>,
    B: Bridge<D>,
{
    match step {
        Step::Add { element } => {
            collection.add(element.clone())?;
        }
        Step::Remove { element } => {
            collection.remove(element)?;
        }
        Step::AddAll { elements } => {
            collection.add_all(elements.iter().cloned())?;
        }
        Step::RemoveAll { elements } => {
            collection.remove_all(elements.iter().cloned())?;
        }
        Step::RetainAll { elements } => {
            collection.retain_all(elements.iter().cloned())?;
        }
        Step::CursorRemove { elements } => {
            let mut cursor = collection.cursor();
            while let Some(item) = cursor.next() {
                if elements.contains(&item) {
                    cursor.remove()?;
                }
            }
        }
        Step::Clear => collection.clear()?,
        _ => return Err(StepFailure::NotApplicable),
    }
    Ok(())
}

fn apply_map(map: &mut ObservableMap<BTreeMap<String, String>>, step: &Step) -> StepResult {
    match step {
        Step::Put { key, value } => {
            map.put(key.clone(), value.clone())?;
        }
        Step::PutAll { entries } => map.put_all(entries.iter().cloned())?,
        Step::RemoveKey { key } => {
            map.remove(key)?;
        }
        Step::Clear => map.clear()?,
        Step::KeysRemove { key } => {
            map.key_set().remove(key)?;
        }
        Step::KeysAdd { key } => {
            map.key_set().add(key.clone())?;
        }
        Step::KeysRetainAll { keys } => {
            map.key_set().retain_all(keys.iter().cloned())?;
        }
        Step::KeysClear => map.key_set().clear()?,
        Step::ValuesRemove { value } => {
            map.values().remove(value)?;
        }
        Step::ValuesClear => map.values().clear()?,
        Step::EntriesRemove { key, value } => {
            map.entry_set().remove(&(key.clone(), value.clone()))?;
        }
        Step::EntriesAdd { key, value } => {
            map.entry_set().add((key.clone(), value.clone()))?;
        }
        Step::EntriesRetainAll { entries } => {
            map.entry_set().retain_all(entries.iter().cloned())?;
        }
        _ => return Err(StepFailure::NotApplicable),
    }
    Ok(())
}

/// Run `script` against a fresh container.
///
/// With `fail_fast`, replay stops after the first rejected step.
pub fn replay(
    script: &Script,
    path: &Path,
    config: Option<&Path>,
    fail_fast: bool,
) -> Result<ReplayReport> {
    let fallback = config.map(load_config).transpose()?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("script");
    let observe = script.observe_config(fallback, name);

    let counter = Rc::new(ChangeCounter::new());
    let vigil = Vigil::builder()
        .with_config(observe)
        .with_logging(Level::DEBUG)
        .with_counter(Rc::clone(&counter))
        .build();

    let mut target = Target::build(script, &vigil);
    info!(
        script = %path.display(),
        kind = %script.container.kind,
        steps = script.steps.len(),
        "Replaying script"
    );

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let (status, error) = match target.apply(step) {
            Ok(()) => (StepStatus::Applied, None),
            Err(StepFailure::Rejected(err)) => {
                warn!(index, op = step.name(), error = %err, "Step rejected");
                (StepStatus::Rejected, Some(err.to_string()))
            }
            Err(StepFailure::NotApplicable) => {
                debug!(index, op = step.name(), "Step skipped");
                (StepStatus::Skipped, None)
            }
        };

        steps.push(StepReport {
            index,
            op: step.name(),
            status,
            error,
            changes: target.drain(),
        });

        if fail_fast && status == StepStatus::Rejected {
            break;
        }
    }

    Ok(ReplayReport {
        script: path.display().to_string(),
        kind: script.container.kind,
        label: target.label(),
        steps,
        contents: target.contents(),
        stats: counter.stats(),
    })
}

/// Execute the replay command.
pub fn execute(
    args: ReplayArgs,
    config: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let script = Script::load(&args.script)?;
    let report = replay(&script, &args.script, config, args.fail_fast)
        .with_context(|| format!("Failed to replay {}", args.script.display()))?;

    match format {
        OutputFormat::Human => {
            if !quiet {
                print_human(&report);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    let rejected = report.rejected();
    if args.fail_fast && rejected > 0 {
        return Err(anyhow::anyhow!("Replay stopped at a rejected step"));
    }
    Ok(())
}

fn print_human(report: &ReplayReport) {
    println!("Replaying: {}", report.script);
    println!("  Container: {}", report.kind);
    if let Some(label) = &report.label {
        println!("  Label: {}", label);
    }
    println!();

    for step in &report.steps {
        let status = match step.status {
            StepStatus::Applied => "ok",
            StepStatus::Rejected => "REJECTED",
            StepStatus::Skipped => "skipped",
        };
        println!("[{:>3}] {:<20} {}", step.index, step.op, status);
        if let Some(error) = &step.error {
            println!("        {}", error);
        }
        for change in &step.changes {
            println!("        {}", change);
        }
    }

    println!();
    println!("Contents: {}", report.contents);
    println!("Stats: {}", report.stats.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> ReplayReport {
        let script = Script::parse(text).unwrap();
        replay(&script, Path::new("test.toml"), None, false).unwrap()
    }

    #[test]
    fn test_list_replay() {
        let report = run(r#"
            [container]
            kind = "list"
            elements = ["A", "B", "C", "D", "E"]

            [[step]]
            op = "add_all"
            elements = ["F", "G", "H"]

            [[step]]
            op = "remove_all"
            elements = ["A", "C", "Z"]

            [[step]]
            op = "put"
            key = "1"
            value = "X"
        "#);

        assert_eq!(report.label.as_deref(), Some("test"));
        assert_eq!(report.steps[0].status, StepStatus::Applied);
        assert_eq!(report.steps[0].changes.len(), 1);
        assert_eq!(report.steps[0].changes[0]["added"], json!(["F", "G", "H"]));
        assert_eq!(report.steps[1].changes[0]["removed"], json!(["A", "C", "Z"]));
        assert_eq!(report.steps[2].status, StepStatus::Skipped);
        assert_eq!(report.contents, json!(["B", "D", "E", "F", "G", "H"]));
        assert_eq!(report.stats.changes, 2);
    }

    #[test]
    fn test_set_cursor_replay() {
        let report = run(r#"
            [container]
            kind = "set"
            elements = ["A", "B", "C"]

            [[step]]
            op = "cursor_remove"
            elements = ["A", "C"]
        "#);

        assert_eq!(report.steps[0].changes.len(), 2);
        assert_eq!(report.contents, json!(["B"]));
    }

    #[test]
    fn test_map_views_replay() {
        let report = run(r#"
            [container]
            kind = "map"
            entries = [["1", "A"], ["2", "B"], ["3", "C"]]

            [[step]]
            op = "keys_remove"
            key = "1"

            [[step]]
            op = "values_clear"

            [[step]]
            op = "entries_remove"
            key = "2"
            value = "B"
        "#);

        let removed = &report.steps[0].changes[0];
        assert_eq!(removed["was_removed"], json!(true));
        assert_eq!(removed["removed"], json!([{ "1": "A" }]));

        assert_eq!(report.steps[1].status, StepStatus::Rejected);
        assert!(report.steps[1].changes.is_empty());
        assert_eq!(report.rejected(), 1);

        assert_eq!(report.steps[2].changes.len(), 1);
        assert_eq!(report.contents, json!({ "3": "C" }));
    }

    #[test]
    fn test_fail_fast_stops() {
        let script = Script::parse(
            r#"
            [container]
            kind = "map"

            [[step]]
            op = "keys_add"
            key = "1"

            [[step]]
            op = "put"
            key = "1"
            value = "A"
        "#,
        )
        .unwrap();

        let report = replay(&script, Path::new("stop.toml"), None, true).unwrap();
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.contents, json!({}));
    }
}
