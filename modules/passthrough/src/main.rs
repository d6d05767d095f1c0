//! Passthrough module: returns its input unchanged, optionally prefixed.
//!
//! Useful for testing pipelines and debugging reference propagation.
//!
//! ```yaml
//! - name: passthrough
//!   input: "$ip_locator"
//!   config:
//!     prefix: "seen: "
//! ```

use opentrace_sdk::prelude::*;

struct Passthrough;

impl Module for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn run(&self, input: ModuleInput) -> ModuleResult<ModuleOutput> {
        let prefix = match input.config("prefix") {
            None | Some(Value::Null) => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err(ModuleError::config("prefix", "a string")),
        };
        eprintln!("passthrough: {} bytes", input.input.len());
        Ok(ModuleOutput::new(format!("{prefix}{}", input.input)))
    }
}

opentrace_sdk::entry!(Passthrough);
