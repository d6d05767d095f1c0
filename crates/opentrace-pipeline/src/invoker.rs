//! Module subprocess invoker.
//!
//! Runs one module executable per step using the JSON stdin/stdout protocol.
//!
//! ## Protocol
//!
//! **stdin** (JSON): a single `{"input": "...", "config": {...}}` document,
//! then EOF.
//!
//! **stdout** (JSON): captured in full; must hold exactly one
//! `{"result": "..."}` document on a zero exit.
//!
//! **stderr**: inherited, so module display text reaches the operator live.
//! Never parsed.
//!
//! **exit code**: non-zero is an error regardless of stdout.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::InvokeError;
use crate::protocol::{ModuleInput, ModuleOutput};

/// Path of the executable for `name` inside `module_dir`.
///
/// Appends the platform executable suffix (`.exe` on Windows).
pub fn module_path(module_dir: &Path, name: &str) -> PathBuf {
    module_dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}

/// Executes a single module and returns its result string.
#[async_trait]
pub trait ModuleInvoker: Send + Sync {
    async fn invoke(
        &self,
        executable: &Path,
        input: &ModuleInput,
        cancel: &CancellationToken,
    ) -> Result<String, InvokeError>;
}

/// Invoker that spawns each module as a fresh child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    /// Kill the module if it runs longer than this.
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-module timeout. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

enum Interrupt {
    Cancelled,
    TimedOut,
}

#[async_trait]
impl ModuleInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        executable: &Path,
        input: &ModuleInput,
        cancel: &CancellationToken,
    ) -> Result<String, InvokeError> {
        if !executable.is_file() {
            return Err(InvokeError::ModuleNotFound {
                path: executable.to_path_buf(),
            });
        }

        let payload = serde_json::to_vec(input).map_err(InvokeError::Serialize)?;

        let mut child = Command::new(executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InvokeError::Spawn {
                path: executable.to_path_buf(),
                source: e,
            })?;

        debug!(
            executable = %executable.display(),
            pid = ?child.id(),
            input_bytes = payload.len(),
            "Module spawned"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("module stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("module stdout was not captured"))?;

        let interrupt = tokio::select! {
            biased;
            _ = cancel.cancelled() => Interrupt::Cancelled,
            _ = deadline(self.timeout) => Interrupt::TimedOut,
            exchanged = exchange(&mut child, stdin, stdout, &payload) => {
                let (status, captured) = exchanged?;
                debug!(
                    status = %status,
                    stdout_bytes = captured.len(),
                    "Module exited"
                );
                if !status.success() {
                    return Err(InvokeError::Exited {
                        code: status.code(),
                    });
                }
                return parse_output(&captured);
            }
        };

        if let Err(e) = child.kill().await {
            warn!(executable = %executable.display(), error = %e, "Failed to kill module");
        }

        match interrupt {
            Interrupt::Cancelled => Err(InvokeError::Cancelled),
            Interrupt::TimedOut => Err(InvokeError::TimedOut {
                timeout: self.timeout.unwrap_or_default(),
            }),
        }
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

/// Feed stdin, drain stdout, then reap the child.
///
/// Writing and reading run concurrently so a module that prints before it
/// finishes reading cannot fill the pipe and stall.
async fn exchange(
    child: &mut Child,
    mut stdin: ChildStdin,
    mut stdout: ChildStdout,
    payload: &[u8],
) -> Result<(ExitStatus, Vec<u8>), InvokeError> {
    let write = async move {
        let written = async {
            stdin.write_all(payload).await?;
            stdin.shutdown().await
        }
        .await;
        // stdin drops here, closing the pipe
        match written {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Module closed stdin before reading all input");
                Ok(())
            }
            other => other,
        }
    };

    let read = async move {
        let mut captured = Vec::new();
        stdout.read_to_end(&mut captured).await.map(|_| captured)
    };

    let (written, captured) = tokio::join!(write, read);
    written?;
    let captured = captured?;
    let status = child.wait().await?;
    Ok((status, captured))
}

/// Decode captured stdout into a result string.
fn parse_output(captured: &[u8]) -> Result<String, InvokeError> {
    if captured.iter().all(u8::is_ascii_whitespace) {
        return Err(InvokeError::EmptyOutput);
    }
    serde_json::from_slice::<ModuleOutput>(captured)
        .map(|out| out.result)
        .map_err(|source| InvokeError::MalformedOutput {
            source,
            raw: String::from_utf8_lossy(captured).into_owned(),
        })
}
