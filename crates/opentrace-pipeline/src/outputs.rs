//! Run-scoped store of step results.
//!
//! Results are keyed by step name in insertion order. A key is written once
//! and never overwritten; "not found" and "found, empty" stay distinct.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Append-only mapping from step name to its result string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputStore {
    entries: IndexMap<String, String>,
}

impl OutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step's result.
    ///
    /// Fails if the step already has a recorded result.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(PipelineError::DuplicateOutput(name));
        }
        self.entries.insert(name, result.into());
        Ok(())
    }

    /// Look up a step's result. `None` means the step has not recorded one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, result)` pairs in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a JSON object, preserving record order.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_distinct_from_empty() {
        let mut store = OutputStore::new();
        assert_eq!(store.get("silent"), None);
        store.insert("silent", "").unwrap();
        assert_eq!(store.get("silent"), Some(""));
    }

    #[test]
    fn test_insert_is_write_once() {
        let mut store = OutputStore::new();
        store.insert("ip_locator", "first").unwrap();
        let err = store.insert("ip_locator", "second").unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateOutput(ref n) if n == "ip_locator"));
        assert_eq!(store.get("ip_locator"), Some("first"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_iteration_in_insertion_order() {
        let mut store = OutputStore::new();
        store.insert("zeta", "1").unwrap();
        store.insert("alpha", "2").unwrap();
        store.insert("mid", "3").unwrap();
        let names: Vec<_> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_to_json_preserves_order_and_values() {
        let mut store = OutputStore::new();
        store.insert("b", r#"{"city":"Mountain View"}"#).unwrap();
        store.insert("a", "").unwrap();
        let rendered = serde_json::to_string(&store.to_json()).unwrap();
        assert_eq!(rendered, r#"{"b":"{\"city\":\"Mountain View\"}","a":""}"#);
    }

    #[test]
    fn test_len_and_contains() {
        let mut store = OutputStore::new();
        assert!(store.is_empty());
        store.insert("one", "x").unwrap();
        assert!(store.contains("one"));
        assert!(!store.contains("two"));
        assert_eq!(store.len(), 1);
    }
}
