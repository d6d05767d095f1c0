//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A config value is present but unusable.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// Neither `OPENTRACE_HOME` nor a user home directory is available.
    #[error("cannot locate the opentrace home directory; set OPENTRACE_HOME")]
    NoHome,
}
