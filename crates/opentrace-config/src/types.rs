//! Configuration types.
//!
//! ```toml
//! [modules]
//! dir = "/opt/opentrace/bin"
//! timeout_secs = 120
//!
//! [logging]
//! level = "info"
//! file = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpentraceConfig {
    pub modules: ModulesConfig,
    pub logging: LoggingConfig,
}

impl OpentraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// `[modules]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Directory holding module executables. Default: `<home>/bin`.
    pub dir: Option<PathBuf>,

    /// Per-module timeout in seconds. Unset or `0` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl ModulesConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `--verbose` is not given.
    pub level: Option<String>,

    /// Write a rolling JSON log under `<home>/logs`.
    /// Default: true
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            file: true,
        }
    }
}
