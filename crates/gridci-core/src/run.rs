//! Run and job types, with explicit state machines.
//!
//! A `Run` is created iff a trigger rule matched an event, owns its jobs
//! exclusively, and lives until every job reaches a terminal state. State
//! transitions are checked methods, never inferred from side effects.

use crate::config::TargetId;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::ids::{JobId, RunId};
use crate::ports::JobOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One target-specific execution unit within a run. Immutable; executed
/// once, never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Position in the matrix, also the job's result slot.
    pub index: usize,
    pub target: TargetId,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    /// The command ran and exited non-zero.
    Failed,
    /// The engine could not run the command (infrastructure failure).
    Errored,
    /// Cancelled by fail-fast before reaching a terminal outcome.
    Aborted,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Errored | JobStatus::Aborted
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

/// Terminal record for one job, written exactly once into its run slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub target: TargetId,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub output: Vec<String>,
    pub duration_ms: Option<u64>,
    /// Engine diagnostics for `Errored` jobs.
    pub message: Option<String>,
}

impl JobResult {
    /// Result for an engine-reported outcome.
    pub fn from_outcome(job: &Job, outcome: JobOutcome) -> Self {
        let status = if outcome.exit_code == 0 {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        Self {
            job_id: job.id,
            target: job.target.clone(),
            status,
            exit_code: Some(outcome.exit_code),
            output: outcome.output,
            duration_ms: Some(outcome.duration_ms),
            message: None,
        }
    }

    /// Result for an infrastructure failure.
    pub fn errored(job: &Job, error: &Error) -> Self {
        Self {
            job_id: job.id,
            target: job.target.clone(),
            status: JobStatus::Errored,
            exit_code: None,
            output: vec![],
            duration_ms: None,
            message: Some(error.to_string()),
        }
    }

    /// Result for a job cancelled by fail-fast.
    pub fn aborted(job: &Job) -> Self {
        Self {
            job_id: job.id,
            target: job.target.clone(),
            status: JobStatus::Aborted,
            exit_code: None,
            output: vec![],
            duration_ms: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    /// Every job succeeded.
    Completed,
    /// At least one job failed and at least one did not.
    PartiallyFailed,
    /// Every job failed or errored.
    Failed,
    /// Fail-fast cancelled the run after the first failure.
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::PartiallyFailed
                | RunStatus::Failed
                | RunStatus::Aborted
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// Aggregate per-job results into the run's terminal state.
    pub fn from_results(results: &[JobResult]) -> Self {
        if results.iter().any(|r| r.status == JobStatus::Aborted) {
            return RunStatus::Aborted;
        }
        if results.iter().all(|r| r.status.is_success()) {
            RunStatus::Completed
        } else if results.iter().any(|r| r.status.is_success()) {
            RunStatus::PartiallyFailed
        } else {
            RunStatus::Failed
        }
    }
}

/// The rule that matched, recorded for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRule {
    pub event_kind: EventKind,
    /// The ref pattern that accepted the event, as authored.
    pub pattern: String,
}

/// One triggered test execution spanning all matrix jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub event: Event,
    pub matched_rule: MatchedRule,
    pub fail_fast: bool,
    pub jobs: Vec<Job>,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn new(event: Event, matched_rule: MatchedRule, fail_fast: bool, jobs: Vec<Job>) -> Self {
        Self {
            id: RunId::new(),
            event,
            matched_rule,
            fail_fast,
            jobs,
            status: RunStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Transition `Pending -> Running`.
    pub fn start(&mut self) -> Result<()> {
        if self.status != RunStatus::Pending {
            return Err(self.invalid_transition(RunStatus::Running));
        }
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Transition `Running -> <terminal>`. Terminal states are final.
    pub fn complete(&mut self, terminal: RunStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::RunAlreadyCompleted);
        }
        if self.status != RunStatus::Running || !terminal.is_terminal() {
            return Err(self.invalid_transition(terminal));
        }
        self.status = terminal;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn invalid_transition(&self, to: RunStatus) -> Error {
        Error::InvalidTransition {
            from: format!("{:?}", self.status),
            to: format!("{:?}", to),
        }
    }
}

/// Aggregated report for a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    pub results: Vec<JobResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}
