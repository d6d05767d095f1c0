//! Wire protocol types for module execution.
//!
//! Every step is an executable that receives a `ModuleInput` on stdin and
//! writes a `ModuleOutput` to stdout, both as JSON. Stderr is reserved for
//! human-readable display and is never parsed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input envelope sent to a module on stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInput {
    /// Literal input or the resolved result of a referenced step.
    pub input: String,
    /// Step configuration, passed through untouched.
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Output envelope expected from a module on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Result string recorded under the step name. May be empty, or itself
    /// JSON that only downstream modules interpret.
    pub result: String,
}
