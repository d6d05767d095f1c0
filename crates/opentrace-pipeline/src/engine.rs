//! Pipeline engine: runs steps in declared order, fail-fast.
//!
//! For each step the engine resolves its input (literal or `$ref`), hands a
//! `ModuleInput` to the [`ModuleInvoker`], and records the result in a fresh
//! [`OutputStore`]. The first error aborts the run; results recorded before
//! it stay available on the [`ExecutionResult`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::definition::{Pipeline, Step};
use crate::error::{PipelineError, Result};
use crate::invoker::{ModuleInvoker, ProcessInvoker, module_path};
use crate::outputs::OutputStore;
use crate::protocol::ModuleInput;

/// Configuration for the pipeline engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding one executable per module name.
    pub module_dir: PathBuf,

    /// Per-module execution timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn new(module_dir: impl Into<PathBuf>) -> Self {
        Self {
            module_dir: module_dir.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Every step ran and recorded a result.
    Completed,
    /// A step failed; later steps were not run.
    Failed,
}

/// Result of a pipeline execution.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Final status.
    pub status: ExecutionStatus,
    /// Results recorded before the run ended, in step order.
    pub outputs: OutputStore,
    /// The error that stopped the run, if it failed.
    pub error: Option<PipelineError>,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }

    /// Name of the step that stopped the run.
    pub fn failed_step(&self) -> Option<&str> {
        self.error.as_ref().and_then(PipelineError::step)
    }

    /// Collapse into the outputs on success or the error on failure.
    pub fn into_result(self) -> Result<OutputStore> {
        match self.error {
            None => Ok(self.outputs),
            Some(e) => Err(e),
        }
    }
}

/// Sequential module execution engine.
pub struct PipelineEngine {
    config: EngineConfig,
    invoker: Arc<dyn ModuleInvoker>,
}

impl PipelineEngine {
    /// Create an engine that spawns modules as subprocesses.
    pub fn new(config: EngineConfig) -> Self {
        let invoker = Arc::new(ProcessInvoker::new().with_timeout(config.timeout));
        Self { config, invoker }
    }

    /// Create an engine with a custom invoker.
    pub fn with_invoker(config: EngineConfig, invoker: Arc<dyn ModuleInvoker>) -> Self {
        Self { config, invoker }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute a pipeline against the configured module directory.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        self.execute_in(pipeline, &self.config.module_dir, cancel).await
    }

    /// Execute a pipeline against an explicit module directory.
    pub async fn execute_in(
        &self,
        pipeline: &Pipeline,
        module_dir: &Path,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let mut outputs = OutputStore::new();

        info!(
            steps = pipeline.len(),
            module_dir = %module_dir.display(),
            "Executing pipeline"
        );

        let outcome = self
            .run_steps(pipeline, module_dir, cancel, &mut outputs)
            .await;
        let duration = started.elapsed();

        match outcome {
            Ok(()) => {
                info!(
                    steps = outputs.len(),
                    elapsed_ms = duration.as_millis() as u64,
                    "Pipeline completed"
                );
                ExecutionResult {
                    status: ExecutionStatus::Completed,
                    outputs,
                    error: None,
                    duration,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    completed = outputs.len(),
                    "Pipeline failed"
                );
                ExecutionResult {
                    status: ExecutionStatus::Failed,
                    outputs,
                    error: Some(e),
                    duration,
                }
            }
        }
    }

    async fn run_steps(
        &self,
        pipeline: &Pipeline,
        module_dir: &Path,
        cancel: &CancellationToken,
        outputs: &mut OutputStore,
    ) -> Result<()> {
        for step in pipeline {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled(step.name.clone()));
            }
            let span = info_span!("step", name = %step.name);
            self.run_step(step, module_dir, cancel, outputs)
                .instrument(span)
                .await?;
        }
        Ok(())
    }

    async fn run_step(
        &self,
        step: &Step,
        module_dir: &Path,
        cancel: &CancellationToken,
        outputs: &mut OutputStore,
    ) -> Result<()> {
        let input = resolve_input(step, outputs)?;
        let module_input = ModuleInput {
            input,
            config: step.config.clone(),
        };
        let executable = module_path(module_dir, &step.name);

        debug!(executable = %executable.display(), "Invoking module");
        let started = Instant::now();

        let result = self
            .invoker
            .invoke(&executable, &module_input, cancel)
            .await
            .map_err(|source| PipelineError::Step {
                step: step.name.clone(),
                source,
            })?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            result_bytes = result.len(),
            "Module completed"
        );

        outputs.insert(step.name.clone(), result)
    }
}

/// Resolve a step's input against recorded outputs.
///
/// A `$name` input must name a step that has already recorded a result;
/// anything else is passed through as a literal.
pub fn resolve_input(step: &Step, outputs: &OutputStore) -> Result<String> {
    match step.reference() {
        Some(reference) => outputs.get(reference).map(str::to_owned).ok_or_else(|| {
            PipelineError::UnresolvedReference {
                step: step.name.clone(),
                reference: reference.to_string(),
            }
        }),
        None => Ok(step.input.clone()),
    }
}
