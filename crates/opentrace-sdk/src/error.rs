//! Error types for module execution.

use std::fmt;

/// Result type for module `run` functions.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Error a module returns. Reported on stderr by the harness.
#[derive(Debug)]
pub enum ModuleError {
    /// A user-facing error message.
    Message(String),
    /// A required config key is absent or has the wrong type.
    Config { key: String, expected: &'static str },
    /// JSON serialization/deserialization error.
    Json(serde_json::Error),
    /// I/O error.
    Io(std::io::Error),
}

impl ModuleError {
    pub fn config(key: impl Into<String>, expected: &'static str) -> Self {
        ModuleError::Config {
            key: key.into(),
            expected,
        }
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleError::Message(msg) => write!(f, "{msg}"),
            ModuleError::Config { key, expected } => {
                write!(f, "config key '{key}' must be {expected}")
            }
            ModuleError::Json(e) => write!(f, "JSON error: {e}"),
            ModuleError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModuleError::Json(e) => Some(e),
            ModuleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<String> for ModuleError {
    fn from(msg: String) -> Self {
        ModuleError::Message(msg)
    }
}

impl From<&str> for ModuleError {
    fn from(msg: &str) -> Self {
        ModuleError::Message(msg.to_string())
    }
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::Json(e)
    }
}

impl From<std::io::Error> for ModuleError {
    fn from(e: std::io::Error) -> Self {
        ModuleError::Io(e)
    }
}
