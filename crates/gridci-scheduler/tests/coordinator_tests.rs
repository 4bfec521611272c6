//! Integration tests for run coordination and the fail-fast policy.

use async_trait::async_trait;
use gridci_core::config::{ConfigFile, OrchestratorConfig, RuleConfig};
use gridci_core::event::{Event, EventKind};
use gridci_core::ports::{ExecutionEngine, JobOutcome};
use gridci_core::run::{Job, JobStatus, RunStatus};
use gridci_core::{Error, Result};
use gridci_scheduler::{RunCoordinator, TriggerEvaluator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Scripted engine: per-target outcome and delay.
#[derive(Clone)]
enum Script {
    Succeed { delay_ms: u64 },
    Fail { delay_ms: u64 },
    Error { delay_ms: u64 },
}

struct StubEngine {
    scripts: HashMap<String, Script>,
}

impl StubEngine {
    fn new(scripts: Vec<(&str, Script)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .into_iter()
                .map(|(t, s)| (t.to_string(), s))
                .collect(),
        })
    }
}

#[async_trait]
impl ExecutionEngine for StubEngine {
    async fn execute(&self, job: &Job, _env: &HashMap<String, String>) -> Result<JobOutcome> {
        let script = self
            .scripts
            .get(job.target.as_str())
            .cloned()
            .unwrap_or(Script::Succeed { delay_ms: 0 });
        match script {
            Script::Succeed { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(JobOutcome {
                    exit_code: 0,
                    output: vec![format!("ok on {}", job.target)],
                    duration_ms: delay_ms,
                })
            }
            Script::Fail { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(JobOutcome {
                    exit_code: 101,
                    output: vec!["test failed".to_string()],
                    duration_ms: delay_ms,
                })
            }
            Script::Error { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(Error::EngineFailure {
                    target: job.target.to_string(),
                    message: "environment unavailable".to_string(),
                })
            }
        }
    }
}

fn config(fail_fast: bool) -> OrchestratorConfig {
    OrchestratorConfig::compile(ConfigFile {
        rules: vec![RuleConfig {
            on: EventKind::Push,
            refs: vec!["master".to_string(), "v[0-9]+.*".to_string()],
        }],
        matrix: vec![
            "ubuntu-latest".to_string(),
            "macos-13".to_string(),
            "macos-latest".to_string(),
            "windows-latest".to_string(),
        ],
        fail_fast,
        command: "cargo test --workspace --all-features --no-fail-fast".to_string(),
        env: HashMap::new(),
    })
    .unwrap()
}

fn trigger(config: &OrchestratorConfig) -> gridci_core::run::Run {
    TriggerEvaluator::new()
        .evaluate(config, &Event::push("master"))
        .expect("rule should match")
}

#[tokio::test]
async fn all_jobs_succeed() {
    let config = config(false);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(report.results.len(), 4);
    // Result slots follow matrix order regardless of completion order.
    let targets: Vec<_> = report.results.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(
        targets,
        vec!["ubuntu-latest", "macos-13", "macos-latest", "windows-latest"]
    );
    assert!(report.results.iter().all(|r| r.exit_code == Some(0)));
}

#[tokio::test]
async fn failure_without_fail_fast_runs_everything() {
    let config = config(false);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![
        ("ubuntu-latest", Script::Fail { delay_ms: 0 }),
        ("macos-13", Script::Succeed { delay_ms: 50 }),
        ("macos-latest", Script::Succeed { delay_ms: 50 }),
        ("windows-latest", Script::Succeed { delay_ms: 50 }),
    ]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::PartiallyFailed);
    // Every sibling still ran to completion.
    assert!(report
        .results
        .iter()
        .all(|r| r.status != JobStatus::Aborted));
    let succeeded = report
        .results
        .iter()
        .filter(|r| r.status == JobStatus::Succeeded)
        .count();
    assert_eq!(succeeded, 3);
}

#[tokio::test]
async fn all_jobs_failing_is_failed_not_partial() {
    let config = config(false);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![
        ("ubuntu-latest", Script::Fail { delay_ms: 0 }),
        ("macos-13", Script::Fail { delay_ms: 0 }),
        ("macos-latest", Script::Fail { delay_ms: 0 }),
        ("windows-latest", Script::Fail { delay_ms: 0 }),
    ]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Failed);
}

#[tokio::test]
async fn fail_fast_aborts_in_flight_jobs() {
    let config = config(true);
    let mut run = trigger(&config);
    assert!(run.fail_fast);
    let engine = StubEngine::new(vec![
        ("ubuntu-latest", Script::Fail { delay_ms: 10 }),
        ("macos-13", Script::Succeed { delay_ms: 5_000 }),
        ("macos-latest", Script::Succeed { delay_ms: 5_000 }),
        ("windows-latest", Script::Succeed { delay_ms: 5_000 }),
    ]);
    let start = std::time::Instant::now();
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Aborted);
    // The slow jobs were cancelled, not run to completion.
    assert!(start.elapsed() < Duration::from_secs(4));
    for result in &report.results {
        match result.target.as_str() {
            "ubuntu-latest" => assert_eq!(result.status, JobStatus::Failed),
            _ => assert_eq!(result.status, JobStatus::Aborted),
        }
    }
}

#[tokio::test]
async fn fail_fast_single_failing_job_aborts_run() {
    // No siblings to cancel: the first failure alone must still end the
    // run Aborted, not Failed.
    let config = OrchestratorConfig::compile(ConfigFile {
        rules: vec![RuleConfig {
            on: EventKind::Push,
            refs: vec!["master".to_string()],
        }],
        matrix: vec!["ubuntu-latest".to_string()],
        fail_fast: true,
        command: "cargo test".to_string(),
        env: HashMap::new(),
    })
    .unwrap();
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![("ubuntu-latest", Script::Fail { delay_ms: 0 })]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(run.status, RunStatus::Aborted);
    assert_eq!(report.results[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn fail_fast_aborts_even_when_siblings_already_finished() {
    // Siblings reach their own terminal states before the failure lands;
    // the run is still aborted, and no job was cancelled mid-flight.
    let config = config(true);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![
        ("ubuntu-latest", Script::Succeed { delay_ms: 0 }),
        ("macos-13", Script::Succeed { delay_ms: 0 }),
        ("macos-latest", Script::Succeed { delay_ms: 0 }),
        ("windows-latest", Script::Fail { delay_ms: 100 }),
    ]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::Aborted);
    assert!(report
        .results
        .iter()
        .all(|r| r.status != JobStatus::Aborted));
}

#[tokio::test]
async fn engine_failure_is_distinguished_from_test_failure() {
    let config = config(false);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![
        ("ubuntu-latest", Script::Error { delay_ms: 0 }),
        ("macos-13", Script::Fail { delay_ms: 0 }),
    ]);
    let report = RunCoordinator::new(engine)
        .execute(&mut run, &config.env)
        .await
        .unwrap();

    assert_eq!(report.status, RunStatus::PartiallyFailed);
    let errored = report
        .results
        .iter()
        .find(|r| r.target.as_str() == "ubuntu-latest")
        .unwrap();
    assert_eq!(errored.status, JobStatus::Errored);
    assert_eq!(errored.exit_code, None);
    assert!(errored
        .message
        .as_deref()
        .unwrap()
        .contains("environment unavailable"));
    let failed = report
        .results
        .iter()
        .find(|r| r.target.as_str() == "macos-13")
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.exit_code, Some(101));
}

#[tokio::test]
async fn terminal_run_cannot_be_executed_again() {
    let config = config(false);
    let mut run = trigger(&config);
    let engine = StubEngine::new(vec![]);
    let coordinator = RunCoordinator::new(engine);
    coordinator.execute(&mut run, &config.env).await.unwrap();
    let err = coordinator.execute(&mut run, &config.env).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}
