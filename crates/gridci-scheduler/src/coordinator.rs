//! Run coordination: parallel job driving and fail-fast policy.

use chrono::Utc;
use gridci_core::ports::ExecutionEngine;
use gridci_core::run::{JobResult, JobStatus, Run, RunReport, RunStatus};
use gridci_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Drives a run's jobs to completion through the execution engine.
///
/// Jobs execute as independent tasks with no shared mutable state; the only
/// shared resource is the result vector, one slot per job, each written
/// exactly once. The caller blocks until every job is terminal.
pub struct RunCoordinator {
    engine: Arc<dyn ExecutionEngine>,
}

impl RunCoordinator {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { engine }
    }

    /// Execute every job of the run and aggregate the terminal state.
    ///
    /// With fail-fast enabled, the first job failure raises a cancellation
    /// signal; jobs still in flight stop at their next checkpoint and report
    /// `Aborted`, never `Completed`.
    pub async fn execute(
        &self,
        run: &mut Run,
        env: &HashMap<String, String>,
    ) -> Result<RunReport> {
        run.start()?;
        let started = run.started_at.unwrap_or_else(Utc::now);
        info!(
            run_id = %run.id,
            jobs = run.jobs.len(),
            fail_fast = run.fail_fast,
            "run started"
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut set = JoinSet::new();

        for job in run.jobs.clone() {
            let engine = Arc::clone(&self.engine);
            let env = env.clone();
            let mut cancel = cancel_rx.clone();
            set.spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.changed() => (job.index, JobResult::aborted(&job)),
                    res = engine.execute(&job, &env) => {
                        let result = match res {
                            Ok(outcome) => JobResult::from_outcome(&job, outcome),
                            Err(err) => JobResult::errored(&job, &err),
                        };
                        (job.index, result)
                    }
                }
            });
        }
        drop(cancel_rx);

        let mut slots: Vec<Option<JobResult>> = vec![None; run.jobs.len()];
        let mut fail_fast_tripped = false;
        while let Some(joined) = set.join_next().await {
            let (index, result) =
                joined.map_err(|e| Error::Internal(format!("job task panicked: {}", e)))?;

            match result.status {
                JobStatus::Succeeded => {
                    info!(run_id = %run.id, target = %result.target, "job succeeded")
                }
                JobStatus::Failed => warn!(
                    run_id = %run.id,
                    target = %result.target,
                    exit_code = result.exit_code,
                    "job failed"
                ),
                JobStatus::Errored => warn!(
                    run_id = %run.id,
                    target = %result.target,
                    message = result.message.as_deref().unwrap_or(""),
                    "job errored"
                ),
                _ => info!(run_id = %run.id, target = %result.target, "job aborted"),
            }

            if run.fail_fast
                && matches!(result.status, JobStatus::Failed | JobStatus::Errored)
            {
                // First failure cancels everything still in flight.
                fail_fast_tripped = true;
                let _ = cancel_tx.send(true);
            }
            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::Internal("missing job result slot".to_string())))
            .collect::<Result<Vec<_>>>()?;

        // Once fail-fast trips the run is aborted, even when every sibling
        // happened to reach its own terminal state before the signal landed.
        let status = if fail_fast_tripped {
            RunStatus::Aborted
        } else {
            RunStatus::from_results(&results)
        };
        run.complete(status)?;
        let completed = run.completed_at.unwrap_or_else(Utc::now);
        info!(run_id = %run.id, status = ?status, "run finished");

        Ok(RunReport {
            run_id: run.id,
            status,
            results,
            started_at: started,
            completed_at: completed,
            duration_ms: (completed - started).num_milliseconds().max(0) as u64,
        })
    }
}
