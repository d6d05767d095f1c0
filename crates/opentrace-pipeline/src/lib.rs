//! Sequential module execution engine for OpenTrace.
//!
//! A pipeline is an ordered list of steps. Each step names an executable in
//! the module directory, gives it one string input (a literal or a `$step`
//! reference to an earlier result), and an opaque config block. The engine
//! runs steps strictly in declared order and threads each result forward.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌─────────────────┐
//! │  Pipeline    │───▶│ PipelineEngine │───▶│ ModuleInvoker   │──▶ subprocess
//! │  (YAML, env  │    │  - resolve $ref│    │  - stdin: JSON  │    stdout: JSON
//! │   expanded)  │    │  - fail fast   │    │  - stdout: JSON │    stderr: live
//! └──────────────┘    └───────┬────────┘    └─────────────────┘
//!                             │
//!                      ┌──────▼──────┐
//!                      │ OutputStore │  step name → result
//!                      └─────────────┘
//! ```

pub mod definition;
pub mod engine;
pub mod error;
pub mod expand;
pub mod invoker;
pub mod outputs;
pub mod protocol;

pub use definition::{Pipeline, PipelineFile, REFERENCE_SIGIL, Step, UnresolvedReference};
pub use engine::{EngineConfig, ExecutionResult, ExecutionStatus, PipelineEngine};
pub use error::{ErrorKind, InvokeError, PipelineError, Result};
pub use expand::expand_env;
pub use invoker::{ModuleInvoker, ProcessInvoker, module_path};
pub use outputs::OutputStore;
pub use protocol::{ModuleInput, ModuleOutput};

pub use tokio_util::sync::CancellationToken;
