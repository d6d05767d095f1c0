//! Wire types as seen from inside a module.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{ModuleError, ModuleResult};

/// Payload the runner writes to the module's stdin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleInput {
    /// Literal input or the previous module's result.
    pub input: String,

    /// The step's `config` block from the pipeline file.
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl ModuleInput {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            config: Map::new(),
        }
    }

    /// Get a raw config value.
    pub fn config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Get a string config value.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config(key)?.as_str()
    }

    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config(key)?.as_bool()
    }

    pub fn config_i64(&self, key: &str) -> Option<i64> {
        self.config(key)?.as_i64()
    }

    /// Get a string config value, failing if it is missing or not a string.
    pub fn require_str(&self, key: &str) -> ModuleResult<&str> {
        self.config_str(key)
            .ok_or_else(|| ModuleError::config(key, "a string"))
    }

    /// Deserialize a config value into a typed struct.
    pub fn config_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let val = self.config(key)?;
        serde_json::from_value(val.clone()).ok()
    }

    /// Parse `input` as JSON, for modules consuming a structured result.
    pub fn input_json<T: DeserializeOwned>(&self) -> ModuleResult<T> {
        Ok(serde_json::from_str(&self.input)?)
    }
}

/// Payload a module writes to stdout. `result` is handed to any step
/// referencing this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutput {
    pub result: String,
}

impl ModuleOutput {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }

    /// Encode structured data as the result string.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ModuleResult<Self> {
        Ok(Self {
            result: serde_json::to_string(value)?,
        })
    }
}
