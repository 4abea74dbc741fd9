//! Redraw decision for the physical panel.
//!
//! The tracker holds the only mutable state of the controller: what was on
//! the panel after the last successful render. It starts uninitialized, moves
//! to tracking after the first successful render and never goes back.
//!
//! Callers must invoke [`DisplayStateTracker::update_state`] only after the
//! renderer reported success. After a failed render the old baseline stays,
//! so the next cycle still sees the change and retries.

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::layout::Layout;
use crate::core::metrics::{MetricValue, MetricsSnapshot};

/// Default maximum time between two redraws
pub const DEFAULT_WATCHDOG_MINUTES: u64 = 30;

const TOLERANCE_EPSILON: f64 = 1e-9;

/// A metric whose change warrants a redraw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedMetric {
    /// Lower-cased metric name
    pub key: String,
    /// Numeric changes smaller than this are ignored; 0 means exact comparison
    pub tolerance: f64,
}

impl TrackedMetric {
    pub fn new<S: AsRef<str>>(key: S, tolerance: f64) -> Self {
        Self {
            key: key.as_ref().to_ascii_lowercase(),
            tolerance,
        }
    }

    pub fn exact<S: AsRef<str>>(key: S) -> Self {
        Self::new(key, 0.0)
    }

    /// Whether the value moved enough to matter
    pub fn changed(&self, old: Option<&MetricValue>, new: Option<&MetricValue>) -> bool {
        match (old, new) {
            (None, None) => false,
            (Some(MetricValue::Number(a)), Some(MetricValue::Number(b))) => {
                // Slack for the rounding error of the subtraction, so a step of
                // exactly one tolerance counts as a change at any magnitude
                let slack = TOLERANCE_EPSILON * a.abs().max(b.abs()).max(1.0);
                a != b && (a - b).abs() >= self.tolerance - slack
            }
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }
}

/// Watchdog interval plus the tracked metrics
#[derive(Debug, Clone, PartialEq)]
pub struct RedrawPolicy {
    pub watchdog: TimeDelta,
    pub tracked: Vec<TrackedMetric>,
}

impl RedrawPolicy {
    pub fn new(watchdog: TimeDelta, tracked: Vec<TrackedMetric>) -> Self {
        Self { watchdog, tracked }
    }

    pub fn tracked_keys(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(|m| m.key.as_str())
    }
}

impl Default for RedrawPolicy {
    fn default() -> Self {
        Self {
            watchdog: TimeDelta::minutes(DEFAULT_WATCHDOG_MINUTES as i64),
            tracked: Vec::new(),
        }
    }
}

/// Why the tracker asked for (or declined) a redraw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RedrawReason {
    InitialRender,
    WatchdogExpired,
    DateRollover,
    LayoutChanged,
    MetricChanged(String),
    NoChange,
}

impl fmt::Display for RedrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedrawReason::InitialRender => f.write_str("initial render"),
            RedrawReason::WatchdogExpired => f.write_str("watchdog interval exceeded"),
            RedrawReason::DateRollover => f.write_str("date rollover"),
            RedrawReason::LayoutChanged => f.write_str("layout changed"),
            RedrawReason::MetricChanged(key) => write!(f, "metric changed: {}", key),
            RedrawReason::NoChange => f.write_str("no change"),
        }
    }
}

/// Outcome of [`DisplayStateTracker::should_render`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedrawDecision {
    pub render: bool,
    pub reason: RedrawReason,
    /// Human-readable specifics for logs, e.g. old and new values
    pub detail: Option<String>,
}

impl RedrawDecision {
    fn render(reason: RedrawReason) -> Self {
        Self {
            render: true,
            reason,
            detail: None,
        }
    }

    fn skip() -> Self {
        Self {
            render: false,
            reason: RedrawReason::NoChange,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl fmt::Display for RedrawDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// What the panel showed after the last successful render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    /// Tracked keys only
    pub last_metrics: BTreeMap<String, MetricValue>,
    pub last_layout: Layout,
    pub last_render_at: DateTime<Local>,
    pub last_render_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct DisplayStateTracker {
    policy: RedrawPolicy,
    state: Option<DisplayState>,
}

impl DisplayStateTracker {
    pub fn new(policy: RedrawPolicy) -> Self {
        Self {
            policy,
            state: None,
        }
    }

    pub fn policy(&self) -> &RedrawPolicy {
        &self.policy
    }

    pub fn state(&self) -> Option<&DisplayState> {
        self.state.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn should_render(&self, context: &MetricsSnapshot, layout: &Layout) -> RedrawDecision {
        self.should_render_at(Local::now(), context, layout)
    }

    /// Redraw decision at an explicit instant. Rules are checked in order and
    /// the first match wins.
    pub fn should_render_at(
        &self,
        now: DateTime<Local>,
        context: &MetricsSnapshot,
        layout: &Layout,
    ) -> RedrawDecision {
        let Some(state) = &self.state else {
            return RedrawDecision::render(RedrawReason::InitialRender);
        };

        let elapsed = now - state.last_render_at;
        if elapsed > self.policy.watchdog {
            return RedrawDecision::render(RedrawReason::WatchdogExpired).with_detail(format!(
                "{} min since last render",
                elapsed.num_minutes()
            ));
        }

        let today = now.date_naive();
        if today != state.last_render_date {
            return RedrawDecision::render(RedrawReason::DateRollover)
                .with_detail(format!("{} -> {}", state.last_render_date, today));
        }

        if layout != &state.last_layout {
            let changes: Vec<String> = state
                .last_layout
                .diff(layout)
                .into_iter()
                .map(|(section, old, new)| {
                    format!("{}: {} -> {}", section, old.unwrap_or("none"), new.unwrap_or("none"))
                })
                .collect();
            return RedrawDecision::render(RedrawReason::LayoutChanged).with_detail(changes.join(", "));
        }

        for metric in &self.policy.tracked {
            let old = state.last_metrics.get(&metric.key);
            let new = context.get(&metric.key);
            if metric.changed(old, new) {
                return RedrawDecision::render(RedrawReason::MetricChanged(metric.key.clone()))
                    .with_detail(format!("{} -> {}", describe(old), describe(new)));
            }
        }

        RedrawDecision::skip()
    }

    /// Record what is now on the panel. Call only after a successful render.
    pub fn update_state(&mut self, context: &MetricsSnapshot, layout: &Layout) {
        self.update_state_at(Local::now(), context, layout);
    }

    pub fn update_state_at(&mut self, now: DateTime<Local>, context: &MetricsSnapshot, layout: &Layout) {
        let last_metrics = context.subset(self.policy.tracked_keys());
        self.state = Some(DisplayState {
            last_metrics,
            last_layout: layout.clone(),
            last_render_at: now,
            last_render_date: now.date_naive(),
        });
    }
}

fn describe(value: Option<&MetricValue>) -> String {
    value.map_or_else(|| "none".to_string(), ToString::to_string)
}
