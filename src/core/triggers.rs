//! Trigger resolution: one active group per section.
//!
//! Triggers are grouped by target section and each section is resolved on its
//! own. Within a section every trigger is evaluated; among those that hold,
//! the highest `priority` wins and equal priorities go to the trigger declared
//! first. A section with no holding trigger gets [`NORMAL_GROUP`].
//!
//! Resolution never fails. A trigger whose condition does not parse or does
//! not evaluate is reported as a [`TriggerDiagnostic`] and counts as false.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::condition::{Condition, EvaluationError, VariableRegistry};
use crate::core::layout::{Layout, ModuleGroupSet, NORMAL_GROUP};
use crate::core::metrics::MetricsSnapshot;

/// Priority used when a trigger does not declare one
pub const DEFAULT_PRIORITY: i64 = 50;

/// A trigger as declared in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub id: String,
    pub condition: String,
    pub target_section: String,
    pub activate_group: String,
    pub priority: i64,
    pub description: String,
}

/// A trigger with its condition parsed once up front
#[derive(Debug, Clone)]
pub struct CompiledTrigger {
    pub definition: TriggerDefinition,
    /// Position in the configuration; lower wins priority ties
    pub declaration_index: usize,
    condition: Result<Condition, EvaluationError>,
}

impl CompiledTrigger {
    pub fn compile(definition: TriggerDefinition, declaration_index: usize) -> Self {
        let condition = Condition::parse(&definition.condition);
        Self {
            definition,
            declaration_index,
            condition,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn condition(&self) -> Result<&Condition, &EvaluationError> {
        self.condition.as_ref()
    }

    pub fn evaluate(
        &self,
        context: &MetricsSnapshot,
        registry: &VariableRegistry,
    ) -> Result<bool, EvaluationError> {
        match &self.condition {
            Ok(condition) => condition.evaluate(context, registry),
            Err(err) => Err(err.clone()),
        }
    }
}

/// All configured triggers in declaration order
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    triggers: Vec<CompiledTrigger>,
}

impl TriggerSet {
    pub fn compile(definitions: Vec<TriggerDefinition>) -> Self {
        let triggers: Vec<CompiledTrigger> = definitions
            .into_iter()
            .enumerate()
            .map(|(index, definition)| CompiledTrigger::compile(definition, index))
            .collect();

        for trigger in &triggers {
            if let Err(err) = trigger.condition() {
                log::warn!(
                    "Trigger '{}' has an invalid condition and will never fire: {}",
                    trigger.id(),
                    err
                );
            }
        }

        Self { triggers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledTrigger> {
        self.triggers.iter()
    }

    pub fn get(&self, id: &str) -> Option<&CompiledTrigger> {
        self.triggers.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Triggers whose condition failed to parse
    pub fn syntax_errors(&self) -> Vec<(&str, &EvaluationError)> {
        self.triggers
            .iter()
            .filter_map(|t| t.condition().err().map(|e| (t.id(), e)))
            .collect()
    }
}

/// Why a trigger was counted as false
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriggerFault {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("target section '{0}' is not defined")]
    UnknownSection(String),

    #[error("group '{group}' is not defined in section '{section}'")]
    UnknownGroup { section: String, group: String },
}

/// A trigger that could not take part in resolution this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDiagnostic {
    pub trigger_id: String,
    pub section: String,
    pub fault: TriggerFault,
}

impl fmt::Display for TriggerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger '{}' ({}): {}", self.trigger_id, self.section, self.fault)
    }
}

/// The trigger that decided a section's group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub trigger_id: String,
    pub section: String,
    pub group: String,
    pub priority: i64,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Exactly one group for every declared section
    pub layout: Layout,
    /// Winning trigger per section that did not fall back to `normal`
    pub activations: Vec<Activation>,
    /// Ids of every trigger that held, declaration order
    pub fired: Vec<String>,
    /// Triggers counted as false because of an error, declaration order
    pub diagnostics: Vec<TriggerDiagnostic>,
}

impl Resolution {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

struct SectionOutcome {
    group: String,
    activation: Option<Activation>,
    fired: Vec<(usize, String)>,
    diagnostics: Vec<(usize, TriggerDiagnostic)>,
}

/// Resolve the active group of every section in `groups`.
///
/// A pure function of its inputs: sections are resolved independently and
/// the result does not depend on the order in which they are visited.
pub fn resolve(
    triggers: &TriggerSet,
    groups: &ModuleGroupSet,
    context: &MetricsSnapshot,
    registry: &VariableRegistry,
) -> Resolution {
    let mut by_section: BTreeMap<&str, Vec<&CompiledTrigger>> = BTreeMap::new();
    let mut fired = Vec::new();
    let mut diagnostics = Vec::new();

    for trigger in triggers.iter() {
        let section = trigger.definition.target_section.as_str();
        if groups.section(section).is_some() {
            by_section.entry(section).or_default().push(trigger);
        } else {
            diagnostics.push((
                trigger.declaration_index,
                TriggerDiagnostic {
                    trigger_id: trigger.id().to_string(),
                    section: section.to_string(),
                    fault: TriggerFault::UnknownSection(section.to_string()),
                },
            ));
        }
    }

    let mut resolution = Resolution::default();

    for section in groups.section_names() {
        let candidates = by_section.get(section).map(Vec::as_slice).unwrap_or(&[]);
        let outcome = resolve_section(section, candidates, groups, context, registry);

        resolution.layout.assign(section, outcome.group);
        resolution.activations.extend(outcome.activation);
        fired.extend(outcome.fired);
        diagnostics.extend(outcome.diagnostics);
    }

    fired.sort_by_key(|(index, _)| *index);
    diagnostics.sort_by_key(|(index, _)| *index);
    resolution.fired = fired.into_iter().map(|(_, id)| id).collect();
    resolution.diagnostics = diagnostics.into_iter().map(|(_, d)| d).collect();

    for diagnostic in &resolution.diagnostics {
        log::warn!("Ignoring {}", diagnostic);
    }

    resolution
}

fn resolve_section(
    section: &str,
    candidates: &[&CompiledTrigger],
    groups: &ModuleGroupSet,
    context: &MetricsSnapshot,
    registry: &VariableRegistry,
) -> SectionOutcome {
    let mut best: Option<&CompiledTrigger> = None;
    let mut fired = Vec::new();
    let mut diagnostics = Vec::new();

    for &trigger in candidates {
        let definition = &trigger.definition;

        if groups.group(section, &definition.activate_group).is_none() {
            diagnostics.push((
                trigger.declaration_index,
                TriggerDiagnostic {
                    trigger_id: trigger.id().to_string(),
                    section: section.to_string(),
                    fault: TriggerFault::UnknownGroup {
                        section: section.to_string(),
                        group: definition.activate_group.clone(),
                    },
                },
            ));
            continue;
        }

        match trigger.evaluate(context, registry) {
            Ok(true) => {
                log::debug!("Trigger '{}' holds -> {}.{}", trigger.id(), section, definition.activate_group);
                fired.push((trigger.declaration_index, trigger.id().to_string()));
                if is_better(trigger, best) {
                    best = Some(trigger);
                }
            }
            Ok(false) => log::trace!("Trigger '{}' does not hold", trigger.id()),
            Err(err) => diagnostics.push((
                trigger.declaration_index,
                TriggerDiagnostic {
                    trigger_id: trigger.id().to_string(),
                    section: section.to_string(),
                    fault: err.into(),
                },
            )),
        }
    }

    match best {
        Some(winner) => SectionOutcome {
            group: winner.definition.activate_group.clone(),
            activation: Some(Activation {
                trigger_id: winner.id().to_string(),
                section: section.to_string(),
                group: winner.definition.activate_group.clone(),
                priority: winner.definition.priority,
            }),
            fired,
            diagnostics,
        },
        None => SectionOutcome {
            group: NORMAL_GROUP.to_string(),
            activation: None,
            fired,
            diagnostics,
        },
    }
}

/// Higher priority wins; on equal priority the earlier declaration wins
fn is_better(candidate: &CompiledTrigger, current: Option<&CompiledTrigger>) -> bool {
    match current {
        None => true,
        Some(current) => {
            let (cp, ci) = (candidate.definition.priority, candidate.declaration_index);
            let (bp, bi) = (current.definition.priority, current.declaration_index);
            cp > bp || (cp == bp && ci < bi)
        }
    }
}
