//! Shell-based job execution on the host.

use async_trait::async_trait;
use gridci_core::ports::{ExecutionEngine, JobOutcome};
use gridci_core::run::Job;
use gridci_core::{Error, Result};
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{info, warn};

/// Configuration for shell execution.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub timeout_seconds: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Some(3600), // 1 hour default
        }
    }
}

/// Shell engine for executing job commands on the host.
pub struct ShellEngine {
    config: EngineConfig,
}

impl ShellEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Default for ShellEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl ExecutionEngine for ShellEngine {
    async fn execute(&self, job: &Job, env: &HashMap<String, String>) -> Result<JobOutcome> {
        let start = std::time::Instant::now();
        let engine_failure = |message: String| Error::EngineFailure {
            target: job.target.to_string(),
            message,
        };

        info!(job_id = %job.id, target = %job.target, command = %job.command, "executing job");

        // Inherit the host environment, then layer the configured job env
        // and the target identifier on top.
        let mut env_vars: HashMap<String, String> = std::env::vars().collect();
        env_vars.extend(env.clone());
        env_vars.insert("GRIDCI_TARGET".to_string(), job.target.to_string());

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&job.command)
            .envs(&env_vars)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A cancelled job must not leave its child running.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| engine_failure(format!("failed to spawn process: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| engine_failure("missing stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| engine_failure("missing stderr pipe".to_string()))?;

        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);

        let stdout_tx = line_tx.clone();
        let stdout_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stdout_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let stderr_tx = line_tx;
        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stderr_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let collector = tokio::spawn(async move {
            let mut output = Vec::new();
            while let Some(line) = line_rx.recv().await {
                output.push(line);
            }
            output
        });

        let status = if let Some(timeout_secs) = self.config.timeout_seconds {
            match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                Ok(result) => {
                    result.map_err(|e| engine_failure(format!("wait failed: {}", e)))?
                }
                Err(_) => {
                    warn!(job_id = %job.id, target = %job.target, "job timed out, killing");
                    let _ = child.kill().await;
                    return Err(engine_failure(format!(
                        "timed out after {} seconds",
                        timeout_secs
                    )));
                }
            }
        } else {
            child
                .wait()
                .await
                .map_err(|e| engine_failure(format!("wait failed: {}", e)))?
        };

        // Let the readers drain before collecting.
        let _ = stdout_handle.await;
        let _ = stderr_handle.await;
        let output = collector
            .await
            .map_err(|e| engine_failure(format!("output collector failed: {}", e)))?;

        let exit_code = status.code().unwrap_or(-1);
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(job_id = %job.id, target = %job.target, exit_code, duration_ms, "job finished");

        Ok(JobOutcome {
            exit_code,
            output,
            duration_ms,
        })
    }
}
