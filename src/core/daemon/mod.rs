//! Panel controller daemon: metrics in, frames out.

pub mod renderer;
pub mod runtime;
pub mod shutdown;
pub mod source;
pub mod stats;

pub use renderer::{FrameFileRenderer, LogRenderer, RenderError, Renderer};
pub use runtime::{plan, CycleOutcome, CycleReport, PanelDaemon};
pub use shutdown::ShutdownSignal;
pub use source::{JsonFileSource, MetricsSource, StaticSource};
pub use stats::CycleStats;
