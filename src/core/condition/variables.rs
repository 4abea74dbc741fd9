use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::metrics::MetricValue;

/// Registry entry for one context variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Value substituted when the metrics source does not supply the variable
    #[serde(default)]
    pub fallback: Option<MetricValue>,
    #[serde(default)]
    pub description: String,
}

/// Declared context variables, keyed case-insensitively.
///
/// A variable missing from a snapshot is only substituted when it is declared
/// here with a fallback; otherwise the condition referencing it fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, VariableSpec>", into = "BTreeMap<String, VariableSpec>")]
pub struct VariableRegistry {
    entries: BTreeMap<String, VariableSpec>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare<S: AsRef<str>>(&mut self, name: S, spec: VariableSpec) {
        self.entries.insert(name.as_ref().to_ascii_lowercase(), spec);
    }

    /// Builder-style declaration with a fallback value
    pub fn with_fallback<S: AsRef<str>, V: Into<MetricValue>>(mut self, name: S, fallback: V) -> Self {
        self.declare(
            name,
            VariableSpec {
                fallback: Some(fallback.into()),
                description: String::new(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableSpec)> {
        self.entries.iter()
    }
}

impl From<BTreeMap<String, VariableSpec>> for VariableRegistry {
    fn from(map: BTreeMap<String, VariableSpec>) -> Self {
        let mut registry = Self::new();
        for (name, spec) in map {
            registry.declare(name, spec);
        }
        registry
    }
}

impl From<VariableRegistry> for BTreeMap<String, VariableSpec> {
    fn from(registry: VariableRegistry) -> Self {
        registry.entries
    }
}
