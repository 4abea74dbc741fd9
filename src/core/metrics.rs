//! Metrics snapshot passed through one evaluation cycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single metric value supplied by the acquisition side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short kind name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            MetricValue::Bool(_) => "boolean",
            MetricValue::Number(_) => "number",
            MetricValue::Text(_) => "text",
        }
    }

    /// Convert a scalar JSON value. Objects, arrays and null have no metric form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetricValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(MetricValue::Number),
            serde_json::Value::String(s) => Some(MetricValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Parse a command-line `key=value` right-hand side
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return MetricValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return MetricValue::Bool(false);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => MetricValue::Number(n),
            _ => MetricValue::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Bool(b) => write!(f, "{}", b),
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

/// Named value bag for one cycle.
///
/// Names are case-insensitive: they are stored lower-cased and every lookup
/// lower-cases its key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, MetricValue>", into = "BTreeMap<String, MetricValue>")]
pub struct MetricsSnapshot {
    values: BTreeMap<String, MetricValue>,
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: AsRef<str>, V: Into<MetricValue>>(&mut self, key: K, value: V) {
        self.values
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Builder-style insert
    pub fn with<K: AsRef<str>, V: Into<MetricValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.values.get(&key.to_ascii_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.values.iter()
    }

    /// Build a snapshot from a flat JSON object.
    ///
    /// Returns the snapshot and the keys that were skipped because their value
    /// is not a scalar.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> (Self, Vec<String>) {
        let mut snapshot = Self::new();
        let mut skipped = Vec::new();

        for (key, value) in object {
            if key.starts_with('_') {
                continue;
            }
            match MetricValue::from_json(value) {
                Some(v) => snapshot.insert(key, v),
                None => skipped.push(key.clone()),
            }
        }

        (snapshot, skipped)
    }

    /// Copy only the given keys (used to keep the redraw baseline small)
    pub fn subset<'a, I>(&self, keys: I) -> BTreeMap<String, MetricValue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter_map(|k| {
                let key = k.to_ascii_lowercase();
                self.values.get(&key).map(|v| (key, v.clone()))
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<MetricValue>> FromIterator<(K, V)> for MetricsSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for (k, v) in iter {
            snapshot.insert(k, v);
        }
        snapshot
    }
}

impl From<BTreeMap<String, MetricValue>> for MetricsSnapshot {
    fn from(values: BTreeMap<String, MetricValue>) -> Self {
        values.into_iter().collect()
    }
}

impl From<MetricsSnapshot> for BTreeMap<String, MetricValue> {
    fn from(snapshot: MetricsSnapshot) -> Self {
        snapshot.values
    }
}
