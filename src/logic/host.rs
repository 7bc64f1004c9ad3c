//! Evaluation host.
//!
//! Every request runs in a fresh worker, either a blocking task sharing the
//! read-only rule base or a child process speaking JSON over stdin/stdout.
//! Whatever goes wrong inside the worker (panic, crash, timeout, garbage
//! output) comes back as a single failure response.

use super::normalizer::Normalizer;
use super::rules::RulesEngine;
use crate::config::{Config, EngineConfig, HostConfig, WorkerMode};
use crate::error::{EcoWoodError, Result};
use crate::models::{AnalysisRequest, AnalysisResponse, MachineAvailability, MachinesInput};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Lifecycle of one invocation. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::Completed => "completed",
            WorkerState::Failed => "failed",
        }
    }

    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Completed | WorkerState::Failed)
    }

    fn advance(&mut self, next: WorkerState) {
        let allowed = matches!(
            (*self, next),
            (WorkerState::Idle, WorkerState::Running)
                | (WorkerState::Running, WorkerState::Completed)
                | (WorkerState::Running, WorkerState::Failed)
        );
        debug_assert!(allowed, "invalid worker transition {:?} -> {:?}", self, next);
        if allowed {
            *self = next;
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final state plus the response handed to the caller.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: WorkerState,
    pub response: AnalysisResponse,
    pub elapsed: Duration,
}

/// Payload a process worker reads from stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub request: AnalysisRequest,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Normalizes and evaluates one request. Pure apart from debug logging.
pub fn evaluate(
    normalizer: &Normalizer,
    engine: &RulesEngine,
    request: &AnalysisRequest,
    machines: Option<&MachineAvailability>,
) -> AnalysisResponse {
    match normalizer.normalize(request, machines) {
        Ok(facts) => {
            let evaluation = engine.evaluate(&facts);
            debug!(fired = ?evaluation.fired, "Evaluation finished");
            AnalysisResponse::success(evaluation.recommendations, facts)
        }
        Err(e) => AnalysisResponse::failure(e.to_string()),
    }
}

/// Process-mode worker body: one request in, one response out.
pub fn run_worker<R: Read, W: Write>(input: R, mut output: W) -> Result<()> {
    let response = match serde_json::from_reader::<_, WorkerRequest>(input) {
        Ok(job) => evaluate(
            &Normalizer::new(job.engine),
            &RulesEngine::new(),
            &job.request,
            None,
        ),
        Err(e) => AnalysisResponse::failure(format!("invalid worker request: {}", e)),
    };

    serde_json::to_writer(&mut output, &response)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub struct EvaluationHost {
    engine: Arc<RulesEngine>,
    engine_config: EngineConfig,
    mode: WorkerMode,
    timeout: Duration,
    program: Option<PathBuf>,
    args: Vec<String>,
}

impl EvaluationHost {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(config.engine.clone(), &config.host)
    }

    pub fn from_parts(engine_config: EngineConfig, host: &HostConfig) -> Self {
        Self {
            engine: Arc::new(RulesEngine::new()),
            engine_config,
            mode: host.mode,
            timeout: host.timeout(),
            program: host.worker_program.clone(),
            args: vec!["worker".to_string()],
        }
    }

    /// Overrides the process-mode command line.
    #[cfg(test)]
    pub fn with_worker_command(mut self, program: impl Into<PathBuf>, args: &[&str]) -> Self {
        self.program = Some(program.into());
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Runs one analysis and returns only the response.
    #[cfg(test)]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        machines: Option<&MachineAvailability>,
    ) -> AnalysisResponse {
        self.run(request, machines).await.response
    }

    /// Runs one analysis in a fresh worker. Never retries.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        machines: Option<&MachineAvailability>,
    ) -> Outcome {
        let mut state = WorkerState::Idle;
        let started = Instant::now();

        state.advance(WorkerState::Running);
        debug!(mode = self.mode.as_str(), "Worker started");

        let result = match self.mode {
            WorkerMode::Thread => self.run_thread(request, machines).await,
            WorkerMode::Process => self.run_process(request, machines).await,
        };

        let response = match result {
            Ok(response) if response.is_well_formed() => {
                state.advance(WorkerState::Completed);
                response
            }
            Ok(_) => {
                state.advance(WorkerState::Failed);
                AnalysisResponse::failure("worker returned a malformed response")
            }
            Err(e) => {
                warn!(error = %e, mode = self.mode.as_str(), "Worker failed");
                state.advance(WorkerState::Failed);
                AnalysisResponse::failure(e.to_string())
            }
        };

        let elapsed = started.elapsed();
        info!(
            mode = self.mode.as_str(),
            state = state.as_str(),
            success = response.is_success(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis finished"
        );

        Outcome {
            state,
            response,
            elapsed,
        }
    }

    async fn run_thread(
        &self,
        request: &AnalysisRequest,
        machines: Option<&MachineAvailability>,
    ) -> Result<AnalysisResponse> {
        let engine = Arc::clone(&self.engine);
        let normalizer = Normalizer::new(self.engine_config.clone());
        let request = request.clone();
        let machines = machines.cloned();

        let handle = tokio::task::spawn_blocking(move || {
            evaluate(&normalizer, &engine, &request, machines.as_ref())
        });

        // A timed-out blocking task is detached, not cancelled. Its result is dropped.
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(EcoWoodError::Evaluation(format!("worker aborted: {}", e))),
            Err(_) => Err(self.timed_out()),
        }
    }

    async fn run_process(
        &self,
        request: &AnalysisRequest,
        machines: Option<&MachineAvailability>,
    ) -> Result<AnalysisResponse> {
        let mut request = request.clone();
        if let Some(machines) = machines {
            request.machines = Some(MachinesInput {
                available_types: machines.codes().iter().map(|c| c.to_string()).collect(),
            });
        }
        let payload = serde_json::to_vec(&WorkerRequest {
            request,
            engine: self.engine_config.clone(),
        })?;

        let program = match &self.program {
            Some(p) => p.clone(),
            None => std::env::current_exe()?,
        };

        debug!(program = %program.display(), args = ?self.args, "Spawning worker process");

        let result = tokio::time::timeout(self.timeout, async {
            let mut child = Command::new(&program)
                .args(&self.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            if let Some(mut stdin) = child.stdin.take() {
                // A worker that exits without reading is judged by its exit status.
                if let Err(e) = stdin.write_all(&payload).await {
                    debug!(error = %e, "Worker closed stdin early");
                }
            }

            child.wait_with_output().await
        })
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(EcoWoodError::Evaluation(format!(
                    "worker process error: {}",
                    e
                )))
            }
            Err(_) => return Err(self.timed_out()),
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            warn!(status = %output.status, stderr = %stderr.trim(), "Worker exited abnormally");
            return Err(EcoWoodError::Evaluation(format!(
                "worker exited abnormally ({})",
                output.status
            )));
        }
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "Worker stderr");
        }

        serde_json::from_slice::<AnalysisResponse>(&output.stdout).map_err(|e| {
            EcoWoodError::Evaluation(format!("worker returned malformed output: {}", e))
        })
    }

    fn timed_out(&self) -> EcoWoodError {
        EcoWoodError::Evaluation(format!(
            "evaluation timed out after {} ms",
            self.timeout.as_millis()
        ))
    }
}
