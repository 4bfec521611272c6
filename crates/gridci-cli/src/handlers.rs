//! CLI command handlers.

use gridci_core::config::OrchestratorConfig;
use gridci_core::event::Event;
use gridci_core::run::RunStatus;
use gridci_runner::{EngineConfig, ShellEngine};
use gridci_scheduler::{RunCoordinator, TriggerEvaluator};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

/// Load and validate a configuration file, reporting its shape.
pub fn validate(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = OrchestratorConfig::load(path)?;
    println!(
        "configuration OK: {} rule(s), {} target(s), fail_fast={}",
        config.rules.len(),
        config.matrix.len(),
        config.fail_fast
    );
    for target in &config.matrix {
        println!("  target: {}", target);
    }
    Ok(())
}

/// Evaluate an event and print the expanded run as JSON.
pub fn plan(path: &Path, event: &Event) -> Result<(), Box<dyn Error>> {
    let config = OrchestratorConfig::load(path)?;
    match TriggerEvaluator::new().evaluate(&config, event) {
        Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
        None => println!(
            "no trigger rule matched {} of '{}'",
            event.kind, event.ref_name
        ),
    }
    Ok(())
}

/// Evaluate an event and, if a rule matches, execute the run locally.
///
/// Returns the terminal run status, or `None` when nothing matched.
pub async fn run(
    path: &Path,
    event: &Event,
    timeout_seconds: Option<u64>,
) -> Result<Option<RunStatus>, Box<dyn Error>> {
    let config = OrchestratorConfig::load(path)?;
    let Some(mut run) = TriggerEvaluator::new().evaluate(&config, event) else {
        println!(
            "no trigger rule matched {} of '{}'",
            event.kind, event.ref_name
        );
        return Ok(None);
    };

    let engine_config = match timeout_seconds {
        Some(secs) => EngineConfig {
            timeout_seconds: Some(secs),
        },
        None => EngineConfig::default(),
    };
    let engine = Arc::new(ShellEngine::new(engine_config));
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(Some(report.status))
}
