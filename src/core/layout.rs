//! Panel layout model and the active-module resolver.
//!
//! The resolver turns a per-section group assignment into the ordered list
//! of module ids to render. It falls back in three tiers so the panel is
//! never left blank:
//!
//! 1. modules of the assigned groups,
//! 2. modules whose manual `enabled` flag is set,
//! 3. one minimal always-available module.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Name of the group every section must define
pub const NORMAL_GROUP: &str = "normal";

/// Placement of a module on the panel, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A module declared in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: String,
    /// Manual flag; used by the second fallback tier
    pub enabled: bool,
    pub geometry: Geometry,
    pub data_sources: Vec<String>,
}

/// Declared modules in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new(modules: Vec<ModuleDescriptor>) -> Self {
        Self { modules }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Groups available to one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGroups {
    pub name: String,
    pub groups: BTreeMap<String, Vec<String>>,
}

/// Per-section group definitions, in section declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleGroupSet {
    sections: Vec<SectionGroups>,
}

impl ModuleGroupSet {
    pub fn new(sections: Vec<SectionGroups>) -> Self {
        Self { sections }
    }

    pub fn section(&self, name: &str) -> Option<&SectionGroups> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn group(&self, section: &str, group: &str) -> Option<&[String]> {
        self.section(section)
            .and_then(|s| s.groups.get(group))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionGroups> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Active group per section for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout(BTreeMap<String, String>);

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign<S: Into<String>, G: Into<String>>(&mut self, section: S, group: G) {
        self.0.insert(section.into(), group.into());
    }

    /// Builder-style assign
    pub fn with<S: Into<String>, G: Into<String>>(mut self, section: S, group: G) -> Self {
        self.assign(section, group);
        self
    }

    pub fn group_for(&self, section: &str) -> Option<&str> {
        self.0.get(section).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sections whose group differs between `self` and `other`, as
    /// `(section, old, new)`; a missing side is reported as `None`
    pub fn diff<'a>(&'a self, other: &'a Layout) -> Vec<(&'a str, Option<&'a str>, Option<&'a str>)> {
        let mut sections: Vec<&str> = self.0.keys().chain(other.0.keys()).map(String::as_str).collect();
        sections.sort_unstable();
        sections.dedup();

        sections
            .into_iter()
            .filter_map(|section| {
                let old = self.group_for(section);
                let new = other.group_for(section);
                (old != new).then_some((section, old, new))
            })
            .collect()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(s, g)| format!("{}={}", s, g)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Which fallback tier produced the module list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionTier {
    Dynamic,
    Manual,
    Fallback,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTier::Dynamic => f.write_str("dynamic groups"),
            ResolutionTier::Manual => f.write_str("manually enabled modules"),
            ResolutionTier::Fallback => f.write_str("minimal fallback"),
        }
    }
}

/// Ordered, de-duplicated module list for one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModules {
    pub modules: Vec<String>,
    pub tier: ResolutionTier,
}

/// Tier 1: modules of the assigned groups, sections in declaration order
pub fn flatten_groups(layout: &Layout, groups: &ModuleGroupSet) -> Vec<String> {
    let mut ids = Vec::new();

    for section in groups.iter() {
        let Some(group_name) = layout.group_for(&section.name) else {
            continue;
        };
        match section.groups.get(group_name) {
            Some(modules) => {
                log::debug!("Section {}: {} -> {:?}", section.name, group_name, modules);
                ids.extend(modules.iter().cloned());
            }
            None => log::warn!(
                "Section '{}' has no group '{}'; skipping it",
                section.name,
                group_name
            ),
        }
    }

    dedup_preserving_order(ids)
}

/// Tier 2: modules with the manual `enabled` flag, declaration order
pub fn manually_enabled(modules: &ModuleRegistry) -> Vec<String> {
    modules
        .iter()
        .filter(|m| m.enabled)
        .map(|m| m.id.clone())
        .collect()
}

/// Tier 3: the single guaranteed module
pub fn minimal_fallback(fallback_module: &str) -> Vec<String> {
    vec![fallback_module.to_string()]
}

/// Resolve the module list, dropping to the next tier only on an empty result
pub fn resolve_active_modules(
    layout: &Layout,
    groups: &ModuleGroupSet,
    modules: &ModuleRegistry,
    fallback_module: &str,
) -> ActiveModules {
    let dynamic = flatten_groups(layout, groups);
    if !dynamic.is_empty() {
        return ActiveModules {
            modules: dynamic,
            tier: ResolutionTier::Dynamic,
        };
    }

    let manual = manually_enabled(modules);
    if !manual.is_empty() {
        log::info!("No modules from dynamic groups; using {} manually enabled module(s)", manual.len());
        return ActiveModules {
            modules: manual,
            tier: ResolutionTier::Manual,
        };
    }

    log::warn!("No dynamic or manually enabled modules; falling back to '{}'", fallback_module);
    ActiveModules {
        modules: minimal_fallback(fallback_module),
        tier: ResolutionTier::Fallback,
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, enabled: bool) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_string(),
            enabled,
            geometry: Geometry::default(),
            data_sources: Vec::new(),
        }
    }

    fn section(name: &str, groups: Vec<(&str, Vec<&str>)>) -> SectionGroups {
        SectionGroups {
            name: name.to_string(),
            groups: groups
                .into_iter()
                .map(|(g, ids)| (g.to_string(), ids.into_iter().map(String::from).collect()))
                .collect(),
        }
    }

    fn group_set() -> ModuleGroupSet {
        ModuleGroupSet::new(vec![
            section("top", vec![("normal", vec!["main_weather", "clock_module"])]),
            section(
                "bottom",
                vec![
                    ("normal", vec!["barometer_module", "tomorrow_forecast"]),
                    ("precipActive", vec!["precipitation_module", "clock_module"]),
                    ("empty", vec![]),
                ],
            ),
        ])
    }

    #[test]
    fn test_flatten_follows_section_declaration_order() {
        let layout = Layout::new().with("bottom", "normal").with("top", "normal");
        assert_eq!(
            flatten_groups(&layout, &group_set()),
            vec!["main_weather", "clock_module", "barometer_module", "tomorrow_forecast"]
        );
    }

    #[test]
    fn test_flatten_removes_duplicates_keeping_first() {
        let layout = Layout::new().with("top", "normal").with("bottom", "precipActive");
        assert_eq!(
            flatten_groups(&layout, &group_set()),
            vec!["main_weather", "clock_module", "precipitation_module"]
        );
    }

    #[test]
    fn test_flatten_skips_unknown_group() {
        let layout = Layout::new().with("top", "normal").with("bottom", "stormActive");
        assert_eq!(
            flatten_groups(&layout, &group_set()),
            vec!["main_weather", "clock_module"]
        );
    }

    #[test]
    fn test_manual_tier() {
        let modules = ModuleRegistry::new(vec![
            module("main_weather", true),
            module("wind_module", false),
            module("status_module", true),
        ]);
        assert_eq!(manually_enabled(&modules), vec!["main_weather", "status_module"]);
    }

    #[test]
    fn test_fallback_tier() {
        assert_eq!(minimal_fallback("status_module"), vec!["status_module"]);
    }

    #[test]
    fn test_resolve_uses_dynamic_tier_first() {
        let layout = Layout::new().with("top", "normal");
        let modules = ModuleRegistry::new(vec![module("status_module", true)]);

        let active = resolve_active_modules(&layout, &group_set(), &modules, "status_module");
        assert_eq!(active.tier, ResolutionTier::Dynamic);
        assert_eq!(active.modules, vec!["main_weather", "clock_module"]);
    }

    #[test]
    fn test_resolve_drops_to_manual_tier() {
        let layout = Layout::new().with("bottom", "empty");
        let modules = ModuleRegistry::new(vec![module("wind_module", true)]);

        let active = resolve_active_modules(&layout, &group_set(), &modules, "status_module");
        assert_eq!(active.tier, ResolutionTier::Manual);
        assert_eq!(active.modules, vec!["wind_module"]);
    }

    #[test]
    fn test_resolve_never_returns_empty() {
        let active = resolve_active_modules(
            &Layout::new(),
            &ModuleGroupSet::default(),
            &ModuleRegistry::default(),
            "status_module",
        );
        assert_eq!(active.tier, ResolutionTier::Fallback);
        assert_eq!(active.modules, vec!["status_module"]);
    }

    #[test]
    fn test_layout_diff() {
        let old = Layout::new().with("top", "normal").with("bottom", "normal");
        let new = Layout::new().with("top", "normal").with("bottom", "precipActive").with("side", "normal");

        assert_eq!(
            old.diff(&new),
            vec![
                ("bottom", Some("normal"), Some("precipActive")),
                ("side", None, Some("normal")),
            ]
        );
        assert!(old.diff(&old).is_empty());
        assert_eq!(old.to_string(), "{bottom=normal, top=normal}");
    }
}
