//! Error types for pipeline loading and execution.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Broad failure class of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pipeline definition could not be read, parsed, or validated.
    Load,
    /// A step referenced an output that has not been recorded.
    Reference,
    /// A module process could not be run to a successful exit.
    Process,
    /// A module exited cleanly but broke the output protocol.
    Protocol,
}

/// Errors that can occur while loading or executing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Failed to read the pipeline file.
    #[error("cannot read pipeline '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The pipeline text is not valid YAML or has the wrong shape.
    #[error("invalid pipeline YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The pipeline parsed but violates a structural rule.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A step's `$ref` input names a step with no recorded output.
    #[error("module '{step}' references output of '{reference}' but it hasn't run yet")]
    UnresolvedReference { step: String, reference: String },

    /// A module invocation failed.
    #[error("[{step}] {source}")]
    Step {
        step: String,
        #[source]
        source: InvokeError,
    },

    /// The run was cancelled between steps.
    #[error("pipeline cancelled before module '{0}' started")]
    Cancelled(String),

    /// An output was recorded twice under the same step name.
    #[error("output for '{0}' is already recorded")]
    DuplicateOutput(String),
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Read { .. }
            | PipelineError::Parse(_)
            | PipelineError::InvalidPipeline(_)
            | PipelineError::DuplicateOutput(_) => ErrorKind::Load,
            PipelineError::UnresolvedReference { .. } => ErrorKind::Reference,
            PipelineError::Step { source, .. } => source.kind(),
            PipelineError::Cancelled(_) => ErrorKind::Process,
        }
    }

    /// Name of the step the error is attributed to, if any.
    pub fn step(&self) -> Option<&str> {
        match self {
            PipelineError::UnresolvedReference { step, .. }
            | PipelineError::Step { step, .. }
            | PipelineError::Cancelled(step)
            | PipelineError::DuplicateOutput(step) => Some(step),
            _ => None,
        }
    }
}

/// Errors produced by a single module invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No executable exists at the resolved module path.
    #[error("module executable not found at {}", .path.display())]
    ModuleNotFound { path: PathBuf },

    /// The executable exists but could not be started.
    #[error("failed to spawn {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    /// I/O failure on the module's pipes or while waiting on it.
    #[error("module I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The module exited unsuccessfully. `None` means it was killed by a signal.
    #[error("exited with error: {}", describe_exit(.code))]
    Exited { code: Option<i32> },

    /// The cancellation token fired while the module was running.
    #[error("cancelled while running")]
    Cancelled,

    /// The module ran past the configured timeout.
    #[error("timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    /// The module exited cleanly without writing anything to stdout.
    #[error("module produced no output")]
    EmptyOutput,

    /// Stdout was not exactly one `{"result": ...}` document.
    #[error("could not parse output JSON: {source}. stdout: {raw}")]
    MalformedOutput {
        source: serde_json::Error,
        raw: String,
    },

    /// The module input could not be encoded.
    #[error("failed to encode module input: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

impl InvokeError {
    /// Classify this error as a process or protocol failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvokeError::EmptyOutput
            | InvokeError::MalformedOutput { .. }
            | InvokeError::Serialize(_) => ErrorKind::Protocol,
            _ => ErrorKind::Process,
        }
    }
}
