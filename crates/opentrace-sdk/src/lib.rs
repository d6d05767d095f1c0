//! OpenTrace module SDK.
//!
//! A module is a standalone executable. The runner writes one JSON
//! [`ModuleInput`] to its stdin and expects exactly one JSON
//! [`ModuleOutput`] on stdout. Human-readable output goes to stderr, which
//! the runner passes straight through to the operator.
//!
//! # Usage
//!
//! ```rust,no_run
//! use opentrace_sdk::prelude::*;
//!
//! struct Greeter;
//!
//! impl Module for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn run(&self, input: ModuleInput) -> ModuleResult<ModuleOutput> {
//!         eprintln!("greeting {}", input.input);
//!         Ok(ModuleOutput::new(format!("hello, {}", input.input)))
//!     }
//! }
//!
//! opentrace_sdk::entry!(Greeter);
//! ```

use std::io::{Read, Write};

pub mod error;
pub mod protocol;

/// Re-exports for convenient `use opentrace_sdk::prelude::*`.
pub mod prelude {
    pub use crate::Module;
    pub use crate::error::{ModuleError, ModuleResult};
    pub use crate::protocol::{ModuleInput, ModuleOutput};
    pub use serde_json::{Value, json};
}

pub use error::{ModuleError, ModuleResult};
pub use protocol::{ModuleInput, ModuleOutput};

/// A pipeline module.
pub trait Module {
    /// Name used to prefix diagnostics on stderr.
    fn name(&self) -> &str;

    /// Transform one input into one result.
    fn run(&self, input: ModuleInput) -> ModuleResult<ModuleOutput>;
}

/// Entry-point macro that generates a `main()` function for a [`Module`].
///
/// ```rust,no_run
/// # use opentrace_sdk::prelude::*;
/// # struct Scanner;
/// # impl Module for Scanner {
/// #     fn name(&self) -> &str { "scanner" }
/// #     fn run(&self, i: ModuleInput) -> ModuleResult<ModuleOutput> {
/// #         Ok(ModuleOutput::new(i.input))
/// #     }
/// # }
/// opentrace_sdk::entry!(Scanner);
/// ```
#[macro_export]
macro_rules! entry {
    ($module:expr) => {
        fn main() {
            let module = $module;
            if let Err(code) = $crate::run_harness(&module) {
                std::process::exit(code);
            }
        }
    };
}

/// Harness called by the [`entry!`] macro, wired to the process stdio.
///
/// Returns `Ok(())` on success, `Err(exit_code)` on failure.
pub fn run_harness<M: Module + ?Sized>(module: &M) -> Result<(), i32> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    run_with(module, stdin.lock(), stdout.lock(), stderr.lock())
}

/// Harness over arbitrary streams.
///
/// Diagnostics go to `stderr` as `[name] ...` lines; `stdout` only ever
/// receives the single result document.
pub fn run_with<M, R, W, E>(
    module: &M,
    mut stdin: R,
    mut stdout: W,
    mut stderr: E,
) -> Result<(), i32>
where
    M: Module + ?Sized,
    R: Read,
    W: Write,
    E: Write,
{
    let name = module.name();
    let mut fail = |what: &str, e: &dyn std::fmt::Display| {
        let _ = writeln!(stderr, "[{name}] {what}: {e}");
        Err(1)
    };

    let mut raw = String::new();
    if let Err(e) = stdin.read_to_string(&mut raw) {
        return fail("failed to read stdin", &e);
    }

    let input: ModuleInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(e) => return fail("bad input", &e),
    };

    let output = match module.run(input) {
        Ok(output) => output,
        Err(e) => return fail("error", &e),
    };

    let encoded = match serde_json::to_string(&output) {
        Ok(encoded) => encoded,
        Err(e) => return fail("encode output", &e),
    };
    if let Err(e) = writeln!(stdout, "{encoded}").and_then(|()| stdout.flush()) {
        return fail("write output", &e);
    }
    Ok(())
}
