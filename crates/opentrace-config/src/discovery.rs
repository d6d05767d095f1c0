//! Home directory discovery and config loading.
//!
//! Module directory resolution order (first match wins):
//! 1. CLI `--bin-dir` (passed in by the caller)
//! 2. `OPENTRACE_BIN_DIR` environment variable
//! 3. `[modules] dir` in `config.toml`
//! 4. `<home>/bin`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, OpentraceConfig, Result};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "OPENTRACE_HOME";

/// Environment variable overriding the module directory.
pub const BIN_DIR_ENV: &str = "OPENTRACE_BIN_DIR";

const CONFIG_FILE: &str = "config.toml";
const HOME_DIR_NAME: &str = ".opentrace";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed configuration, or defaults when no file exists.
    pub config: OpentraceConfig,
    /// Home directory the config was resolved against.
    pub home: PathBuf,
    /// Config file that was loaded, if any.
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Effective module directory. See the module docs for precedence.
    pub fn module_dir(&self, cli: Option<&Path>) -> PathBuf {
        let env = std::env::var(BIN_DIR_ENV).ok();
        resolve_module_dir(cli, env.as_deref(), &self.config, &self.home)
    }

    /// Directory for rolling log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.home.join("logs")
    }
}

/// Locate the opentrace home: `$OPENTRACE_HOME`, then `~/.opentrace`.
pub fn opentrace_home() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|d| d.join(HOME_DIR_NAME))
}

/// Discover the home directory and load its `config.toml`.
pub fn load_config() -> Result<LoadedConfig> {
    let home = opentrace_home().ok_or(ConfigError::NoHome)?;
    load_config_from(&home)
}

/// Load `config.toml` from an explicit home directory.
///
/// A missing file yields defaults. An unreadable or malformed file is an error.
pub fn load_config_from(home: &Path) -> Result<LoadedConfig> {
    let path = home.join(CONFIG_FILE);
    if !path.is_file() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(LoadedConfig {
            config: OpentraceConfig::new(),
            home: home.to_path_buf(),
            source: None,
        });
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = OpentraceConfig::from_toml(&contents)?;
    debug!(path = %path.display(), "Loaded config");

    Ok(LoadedConfig {
        config,
        home: home.to_path_buf(),
        source: Some(path),
    })
}

/// Pick the module directory from the available sources.
pub fn resolve_module_dir(
    cli: Option<&Path>,
    env: Option<&str>,
    config: &OpentraceConfig,
    home: &Path,
) -> PathBuf {
    if let Some(dir) = cli {
        return dir.to_path_buf();
    }
    if let Some(dir) = env
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    config
        .modules
        .dir
        .clone()
        .unwrap_or_else(|| home.join("bin"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let home = TempDir::new().unwrap();
        let loaded = load_config_from(home.path()).unwrap();
        assert_eq!(loaded.config, OpentraceConfig::default());
        assert!(loaded.source.is_none());
        assert_eq!(loaded.logs_dir(), home.path().join("logs"));
    }

    #[test]
    fn test_loads_config_file() {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[modules]\ndir = \"/srv/modules\"\n",
        )
        .unwrap();

        let loaded = load_config_from(home.path()).unwrap();
        assert_eq!(loaded.source, Some(home.path().join("config.toml")));
        assert_eq!(
            loaded.config.modules.dir,
            Some(PathBuf::from("/srv/modules"))
        );
    }

    #[test]
    fn test_malformed_config_is_error() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), "this is not valid toml {{{{").unwrap();

        let err = load_config_from(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_resolve_module_dir_precedence() {
        let home = Path::new("/home/u/.opentrace");
        let mut config = OpentraceConfig::default();

        assert_eq!(
            resolve_module_dir(None, None, &config, home),
            PathBuf::from("/home/u/.opentrace/bin")
        );

        config.modules.dir = Some(PathBuf::from("/from/config"));
        assert_eq!(
            resolve_module_dir(None, None, &config, home),
            PathBuf::from("/from/config")
        );

        assert_eq!(
            resolve_module_dir(None, Some("/from/env"), &config, home),
            PathBuf::from("/from/env")
        );

        assert_eq!(
            resolve_module_dir(Some(Path::new("/from/cli")), Some("/from/env"), &config, home),
            PathBuf::from("/from/cli")
        );
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = OpentraceConfig::default();
        assert_eq!(
            resolve_module_dir(None, Some(""), &config, Path::new("/h")),
            PathBuf::from("/h/bin")
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_home_env_override() {
        unsafe { std::env::set_var(HOME_ENV, "/tmp/ot-home") };
        let home = opentrace_home();
        unsafe { std::env::remove_var(HOME_ENV) };
        assert_eq!(home, Some(PathBuf::from("/tmp/ot-home")));
    }

    #[test]
    #[serial_test::serial]
    fn test_default_home_under_user_dir() {
        unsafe { std::env::remove_var(HOME_ENV) };
        if let Some(home) = opentrace_home() {
            assert!(home.ends_with(".opentrace"));
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_module_dir_reads_bin_dir_env() {
        let home = TempDir::new().unwrap();
        let loaded = load_config_from(home.path()).unwrap();

        unsafe { std::env::set_var(BIN_DIR_ENV, "/env/bin") };
        let dir = loaded.module_dir(None);
        unsafe { std::env::remove_var(BIN_DIR_ENV) };

        assert_eq!(dir, PathBuf::from("/env/bin"));
        assert_eq!(loaded.module_dir(None), home.path().join("bin"));
    }
}
