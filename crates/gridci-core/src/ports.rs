//! Port traits (hexagonal architecture).
//!
//! The execution engine is an external collaborator: it provisions each
//! target environment and invokes the job command, reporting back exit
//! status and output. The orchestrator only aggregates.

use crate::error::Result;
use crate::run::Job;
use async_trait::async_trait;
use std::collections::HashMap;

/// Outcome reported by the engine for one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub exit_code: i32,
    pub output: Vec<String>,
    pub duration_ms: u64,
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Execution engine boundary.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run one job to completion in its own isolated target environment.
    ///
    /// A non-zero exit is a normal `Ok` outcome; `Err` means the engine
    /// itself could not run the command (environment broken). The future
    /// must be cancellation-safe: dropping it stops the job at its next
    /// checkpoint.
    async fn execute(&self, job: &Job, env: &HashMap<String, String>) -> Result<JobOutcome>;
}
