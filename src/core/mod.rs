// Core decision logic and the daemon built on it

pub mod condition;
pub mod config;
pub mod context;
pub mod daemon;
pub mod display_state;
pub mod layout;
pub mod metrics;
pub mod triggers;

// Re-export commonly used items
pub use condition::{Condition, EvaluationError, VariableRegistry};
pub use config::PanelConfig;
pub use display_state::{DisplayStateTracker, RedrawDecision, RedrawPolicy};
pub use layout::{ActiveModules, Layout, ResolutionTier};
pub use metrics::{MetricValue, MetricsSnapshot};
pub use triggers::{resolve, Resolution, TriggerSet};
