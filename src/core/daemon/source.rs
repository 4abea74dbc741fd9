//! Where each cycle's metrics come from.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::metrics::MetricsSnapshot;
use crate::error::{PanelError, Result};

/// Supplies one snapshot per cycle.
///
/// Any failure must be reported as [`PanelError::ContextUnavailable`]; the
/// cycle is then skipped.
pub trait MetricsSource {
    fn fetch(&mut self) -> Result<MetricsSnapshot>;

    /// Short label for log lines
    fn describe(&self) -> String {
        "metrics source".to_string()
    }
}

/// Reads a flat JSON object written by an external acquisition process
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> PanelError {
        PanelError::context_unavailable(format!("{}: {}", self.path.display(), reason))
    }
}

impl MetricsSource for JsonFileSource {
    fn fetch(&mut self) -> Result<MetricsSnapshot> {
        let data = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let value: serde_json::Value = serde_json::from_str(&data).map_err(|e| self.unavailable(e))?;
        let object = value
            .as_object()
            .ok_or_else(|| self.unavailable("expected a JSON object"))?;

        let (snapshot, skipped) = MetricsSnapshot::from_json_object(object);
        if !skipped.is_empty() {
            log::debug!("Skipped non-scalar metrics: {}", skipped.join(", "));
        }
        log::debug!("Fetched {} metrics from {}", snapshot.len(), self.path.display());

        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Returns the same snapshot every cycle
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: MetricsSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: MetricsSnapshot) -> Self {
        Self { snapshot }
    }
}

impl MetricsSource for StaticSource {
    fn fetch(&mut self) -> Result<MetricsSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} metrics)", self.snapshot.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::MetricValue;

    #[test]
    fn test_json_file_source_reads_flat_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, r#"{"temperature": 4.5, "pressure_trend": "falling", "hourly": [1]}"#).unwrap();

        let mut source = JsonFileSource::new(&path);
        let snapshot = source.fetch().unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("temperature"), Some(&MetricValue::Number(4.5)));
    }

    #[test]
    fn test_missing_file_is_context_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = JsonFileSource::new(dir.path().join("absent.json"));
        assert!(matches!(source.fetch(), Err(PanelError::ContextUnavailable(_))));
    }

    #[test]
    fn test_non_object_is_context_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, PanelError::ContextUnavailable(_)));
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn test_static_source_repeats() {
        let mut source = StaticSource::new(MetricsSnapshot::new().with("temperature", 1.0));
        assert_eq!(source.fetch().unwrap(), source.fetch().unwrap());
        assert_eq!(source.describe(), "static (1 metrics)");
    }
}
