//! Validate command - Check a replay script without running it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::OutputFormat;
use crate::script::{ContainerKind, Script, Step};

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the script (TOML)
    #[arg(required = true)]
    pub script: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Validation result.
#[derive(Debug, Serialize)]
struct ValidationResult {
    valid: bool,
    path: String,
    kind: Option<ContainerKind>,
    steps: usize,
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// Collect the problems of a parsed script into `result`.
fn check(script: &Script, result: &mut ValidationResult) {
    let kind = script.container.kind;
    result.kind = Some(kind);
    result.steps = script.steps.len();

    if script.steps.is_empty() {
        result.warnings.push("Script has no steps".to_string());
    }

    match kind {
        ContainerKind::Map if !script.container.elements.is_empty() => {
            result
                .warnings
                .push("Map container ignores `elements`; use `entries`".to_string());
        }
        ContainerKind::List | ContainerKind::Set if !script.container.entries.is_empty() => {
            result.warnings.push(format!(
                "{} container ignores `entries`; use `elements`",
                kind
            ));
        }
        _ => {}
    }

    for (index, step) in script.steps.iter().enumerate() {
        if !step.applies_to(kind) {
            result.errors.push(format!(
                "Step {} ({}) does not apply to a {} container",
                index,
                step.name(),
                kind
            ));
        } else if step.always_rejected() {
            result.warnings.push(format!(
                "Step {} ({}) is always rejected by its view",
                index,
                step.name()
            ));
        }

        if let Step::PutAll { entries } | Step::EntriesRetainAll { entries } = step {
            if entries.is_empty() {
                result
                    .warnings
                    .push(format!("Step {} ({}) has no entries", index, step.name()));
            }
        }
    }
}

/// Execute the validate command.
pub fn execute(args: ValidateArgs, format: OutputFormat) -> Result<()> {
    let mut result = ValidationResult {
        valid: true,
        path: args.script.display().to_string(),
        kind: None,
        steps: 0,
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    match Script::load(&args.script) {
        Ok(script) => check(&script, &mut result),
        Err(e) => result.errors.push(format!("{:#}", e)),
    }

    result.valid = result.errors.is_empty() && !(args.strict && !result.warnings.is_empty());

    // Output results
    match format {
        OutputFormat::Human => {
            if result.valid {
                println!("Script is valid: {}", args.script.display());
            } else {
                println!("Script is INVALID: {}", args.script.display());
            }
            if let Some(kind) = result.kind {
                println!("  Container: {}", kind);
                println!("  Steps: {}", result.steps);
            }
            for error in &result.errors {
                println!("  Error: {}", error);
            }
            if !result.warnings.is_empty() {
                println!("\nWarnings:");
                for warning in &result.warnings {
                    println!("  - {}", warning);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Validation failed"))
    }
}
