//! Configuration system for the OpenTrace pipeline runner.
//!
//! Everything lives under a single home directory (`~/.opentrace`, or
//! `$OPENTRACE_HOME`):
//!
//! ```text
//! ~/.opentrace/
//! ├── config.toml   optional defaults
//! ├── bin/          module executables
//! └── logs/         rolling JSON logs
//! ```
//!
//! A missing `config.toml` means defaults; a malformed one is an error.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    BIN_DIR_ENV, HOME_ENV, LoadedConfig, load_config, load_config_from, opentrace_home,
    resolve_module_dir,
};
pub use error::{ConfigError, Result};
pub use types::{LoggingConfig, ModulesConfig, OpentraceConfig};
