//! CLI command handlers.

use std::path::{Path, PathBuf};

use opentrace_config::LoadedConfig;

pub mod run;
pub mod validate;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded user configuration.
    pub config: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Effective module directory, honoring a `--bin-dir` override.
    pub fn module_dir(&self, cli: Option<&Path>) -> PathBuf {
        self.config.module_dir(cli)
    }
}
