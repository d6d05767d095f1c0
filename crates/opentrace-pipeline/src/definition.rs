//! Declarative pipeline definition parser.
//!
//! Parses YAML pipeline files into a validated [`Pipeline`]. Environment
//! variables are expanded in the raw text before parsing, so `${VAR}` tokens
//! may appear anywhere, including inside config values.
//!
//! # Example YAML
//!
//! ```yaml
//! modules:
//!   - name: ip_locator
//!     input: "8.8.8.8"
//!     config:
//!       api_key: "${IPINFO_TOKEN}"
//!
//!   - name: asn_lookup
//!     input: "$ip_locator"
//! ```

use std::collections::HashSet;
use std::path::{Component, Path};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PipelineError;
use crate::expand::expand_env;

/// Prefix marking a step input as a reference to an earlier step's result.
pub const REFERENCE_SIGIL: char = '$';

/// Top-level wrapper matching the YAML structure `modules: [...]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub modules: Vec<Step>,
}

/// A single step within a pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Step {
    /// Step name; also the module executable's file name.
    pub name: String,

    /// Literal input, or `$name` to consume an earlier step's result.
    #[serde(default)]
    pub input: String,

    /// Module configuration. Opaque to the engine.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub config: Map<String, Value>,
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Step {
    /// Create a step with an empty config.
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            config: Map::new(),
        }
    }

    /// Attach a config entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// The referenced step name if the input starts with the sigil.
    pub fn reference(&self) -> Option<&str> {
        self.input.strip_prefix(REFERENCE_SIGIL)
    }
}

/// A step whose reference cannot be satisfied by any earlier step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// The step holding the reference.
    pub step: String,
    /// The referenced name.
    pub reference: String,
}

/// A validated, immutable, non-empty sequence of steps.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Build a pipeline from steps, validating them.
    pub fn new(steps: Vec<Step>) -> Result<Self, PipelineError> {
        let pipeline = Self { steps };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Load a pipeline from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), "Loading pipeline");
        Self::from_yaml(&content)
    }

    /// Parse a pipeline from YAML text, expanding `${VAR}` tokens first.
    pub fn from_yaml(content: &str) -> Result<Self, PipelineError> {
        let expanded = expand_env(content);
        let file: PipelineFile = serde_yaml::from_str(&expanded)?;
        Self::new(file.modules)
    }

    /// Validate structural rules.
    ///
    /// Checks:
    /// - At least one step
    /// - Every name is non-empty and a plain file name
    /// - No duplicate names
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.steps.is_empty() {
            return Err(PipelineError::InvalidPipeline(
                "pipeline has no modules".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (idx, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(PipelineError::InvalidPipeline(format!(
                    "module #{} has an empty name",
                    idx + 1
                )));
            }
            if !is_plain_file_name(&step.name) {
                return Err(PipelineError::InvalidPipeline(format!(
                    "module name '{}' must be a plain file name",
                    step.name
                )));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(PipelineError::InvalidPipeline(format!(
                    "duplicate module name '{}'",
                    step.name
                )));
            }
        }

        Ok(())
    }

    /// Steps whose `$ref` does not name a step declared before them.
    ///
    /// These fail at run time; this lets callers report them up front.
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let mut earlier = HashSet::new();
        let mut unresolved = Vec::new();
        for step in &self.steps {
            if let Some(reference) = step.reference()
                && !earlier.contains(reference)
            {
                unresolved.push(UnresolvedReference {
                    step: step.name.clone(),
                    reference: reference.to_string(),
                });
            }
            earlier.insert(step.name.as_str());
        }
        unresolved
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed pipeline.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
