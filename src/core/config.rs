//! Configuration document: modules, module groups, triggers, variables,
//! tracked metrics and daemon settings.
//!
//! The document is JSON. Keys starting with `_` are comments and are removed
//! at any depth before anything else looks at the document. Declaration order
//! of modules, sections and triggers is kept, since it drives module order and
//! the priority tie-break.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::condition::VariableRegistry;
use crate::core::display_state::{RedrawPolicy, TrackedMetric, DEFAULT_WATCHDOG_MINUTES};
use crate::core::layout::{Geometry, ModuleDescriptor, ModuleGroupSet, ModuleRegistry, SectionGroups, NORMAL_GROUP};
use crate::core::triggers::{TriggerDefinition, TriggerSet, DEFAULT_PRIORITY};
use crate::error::{PanelError, Result};

pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_FALLBACK_MODULE: &str = "status_module";

/// Loop settings from the `daemon` block. Unknown keys are rejected so a
/// misspelled setting does not silently fall back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DaemonSettings {
    pub update_interval_secs: u64,
    pub watchdog_minutes: u64,
    pub fallback_module: String,
    /// Add time_hour, time_month, time_weekday and is_daylight to each snapshot
    pub temporal_variables: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            watchdog_minutes: DEFAULT_WATCHDOG_MINUTES,
            fallback_module: DEFAULT_FALLBACK_MODULE.to_string(),
            temporal_variables: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCoords {
    x: u32,
    y: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSize {
    width: u32,
    height: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawModule {
    enabled: bool,
    coords: RawCoords,
    size: RawSize,
    data_sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTrigger {
    condition: String,
    target_section: String,
    activate_group: String,
    priority: i64,
    description: String,
}

impl Default for RawTrigger {
    fn default() -> Self {
        Self {
            condition: String::new(),
            target_section: String::new(),
            activate_group: String::new(),
            priority: DEFAULT_PRIORITY,
            description: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTrackedMetric {
    tolerance: f64,
}

/// Top-level document. Ordered sections stay as raw maps so `preserve_order`
/// keeps their declaration order.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    modules: Map<String, Value>,
    module_groups: Map<String, Value>,
    triggers: Map<String, Value>,
    variables: VariableRegistry,
    tracked_metrics: Map<String, Value>,
    daemon: DaemonSettings,
}

/// Validated, ready-to-run configuration
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub modules: ModuleRegistry,
    pub groups: ModuleGroupSet,
    pub triggers: TriggerSet,
    pub variables: VariableRegistry,
    pub redraw: RedrawPolicy,
    pub daemon: DaemonSettings,
}

impl PanelConfig {
    /// `<config_dir>/paneld/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| PanelError::config("Could not determine config directory"))?;
        Ok(config_dir.join("paneld").join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            return Err(PanelError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let data = fs::read_to_string(&path)?;
        log::debug!("Loaded config from {}", path.display());

        Self::from_json_str(&data)
            .map_err(|e| PanelError::config(format!("{}: {}", path.display(), strip_prefix(&e))))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| PanelError::config(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PanelError::config("top level must be a JSON object"));
        }
        strip_comments(&mut value);

        let raw: RawConfig =
            serde_json::from_value(value).map_err(|e| PanelError::config(e.to_string()))?;

        let config = Self::from_raw(raw)?;
        config.validate()?;

        if config.redraw.tracked.is_empty() {
            log::warn!("No trackedMetrics configured; only layout changes, date rollover and the watchdog will redraw");
        }

        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mut modules = Vec::with_capacity(raw.modules.len());
        for (id, value) in raw.modules {
            let module: RawModule = decode(value, || format!("module '{}'", id))?;
            modules.push(ModuleDescriptor {
                id,
                enabled: module.enabled,
                geometry: Geometry {
                    x: module.coords.x,
                    y: module.coords.y,
                    width: module.size.width,
                    height: module.size.height,
                },
                data_sources: module.data_sources,
            });
        }

        let mut sections = Vec::with_capacity(raw.module_groups.len());
        for (name, value) in raw.module_groups {
            let groups = decode(value, || format!("moduleGroups section '{}'", name))?;
            sections.push(SectionGroups { name, groups });
        }

        let mut definitions = Vec::with_capacity(raw.triggers.len());
        for (id, value) in raw.triggers {
            let trigger: RawTrigger = decode(value, || format!("trigger '{}'", id))?;
            definitions.push(TriggerDefinition {
                id,
                condition: trigger.condition.trim().to_string(),
                target_section: trigger.target_section,
                activate_group: trigger.activate_group,
                priority: trigger.priority,
                description: trigger.description,
            });
        }

        let mut tracked = Vec::with_capacity(raw.tracked_metrics.len());
        for (key, value) in raw.tracked_metrics {
            let metric: RawTrackedMetric = decode(value, || format!("tracked metric '{}'", key))?;
            tracked.push(TrackedMetric::new(key, metric.tolerance));
        }

        let watchdog = i64::try_from(raw.daemon.watchdog_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .ok_or_else(|| PanelError::config("daemon.watchdogMinutes is out of range"))?;

        Ok(Self {
            modules: ModuleRegistry::new(modules),
            groups: ModuleGroupSet::new(sections),
            triggers: TriggerSet::compile(definitions),
            variables: raw.variables,
            redraw: RedrawPolicy::new(watchdog, tracked),
            daemon: raw.daemon,
        })
    }

    /// Check cross references. All problems are reported in one error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.groups.is_empty() {
            problems.push("no sections defined in moduleGroups".to_string());
        }

        for section in self.groups.iter() {
            if !section.groups.contains_key(NORMAL_GROUP) {
                problems.push(format!("section '{}' has no '{}' group", section.name, NORMAL_GROUP));
            }
            for (group, ids) in &section.groups {
                for id in ids {
                    if !self.modules.contains(id) {
                        problems.push(format!(
                            "group '{}.{}' references undeclared module '{}'",
                            section.name, group, id
                        ));
                    }
                }
            }
        }

        for trigger in self.triggers.iter() {
            let def = &trigger.definition;
            if def.condition.is_empty() {
                problems.push(format!("trigger '{}' has an empty condition", def.id));
            }
            if def.target_section.is_empty() {
                problems.push(format!("trigger '{}' has no targetSection", def.id));
            } else if def.activate_group.is_empty() {
                problems.push(format!("trigger '{}' has no activateGroup", def.id));
            } else {
                match self.groups.section(&def.target_section) {
                    None => problems.push(format!(
                        "trigger '{}' targets unknown section '{}'",
                        def.id, def.target_section
                    )),
                    Some(section) if !section.groups.contains_key(&def.activate_group) => {
                        problems.push(format!(
                            "trigger '{}' activates group '{}' which section '{}' does not define",
                            def.id, def.activate_group, def.target_section
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        if !self.modules.contains(&self.daemon.fallback_module) {
            problems.push(format!(
                "fallback module '{}' is not declared in modules",
                self.daemon.fallback_module
            ));
        }

        if self.daemon.update_interval_secs == 0 {
            problems.push("daemon.updateIntervalSecs must be positive".to_string());
        }
        if self.daemon.watchdog_minutes == 0 {
            problems.push("daemon.watchdogMinutes must be positive".to_string());
        }

        for metric in &self.redraw.tracked {
            if !metric.tolerance.is_finite() || metric.tolerance < 0.0 {
                problems.push(format!(
                    "tracked metric '{}' has invalid tolerance {}",
                    metric.key, metric.tolerance
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PanelError::config(problems.join("; ")))
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.daemon.update_interval_secs)
    }

    pub fn fallback_module(&self) -> &str {
        &self.daemon.fallback_module
    }
}

/// Remove `_`-prefixed keys from every object in the tree
pub fn strip_comments(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with('_'));
            for child in map.values_mut() {
                strip_comments(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_comments),
        _ => {}
    }
}

fn decode<T, F>(value: Value, what: F) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce() -> String,
{
    serde_json::from_value(value).map_err(|e| PanelError::config(format!("{}: {}", what(), e)))
}

fn strip_prefix(err: &PanelError) -> String {
    match err {
        PanelError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}
