//! The polling loop: fetch, enrich, resolve, decide, render, record.

use chrono::{DateTime, Local};
use tokio::time::{interval, MissedTickBehavior};

use super::renderer::{RenderError, Renderer};
use super::shutdown::ShutdownSignal;
use super::source::MetricsSource;
use super::stats::CycleStats;
use crate::core::config::PanelConfig;
use crate::core::context::enrich_temporal;
use crate::core::display_state::{DisplayStateTracker, RedrawDecision};
use crate::core::layout::{resolve_active_modules, ActiveModules};
use crate::core::metrics::MetricsSnapshot;
use crate::core::triggers::{resolve, Resolution};
use crate::error::{PanelError, Result};

/// How a cycle ended once metrics were available
#[derive(Debug)]
pub enum CycleOutcome {
    Rendered,
    Unchanged,
    /// At least one dispatch failed; nothing was presented and the
    /// baseline was kept so the next cycle retries
    RenderFailed(Vec<RenderError>),
    /// A redraw was due but shutdown had been requested, before or during
    /// the frame; nothing was presented
    ShutdownRequested,
}

enum Dispatch {
    Presented,
    Failed(Vec<RenderError>),
    Interrupted,
}

#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Local>,
    pub context: MetricsSnapshot,
    pub resolution: Resolution,
    pub active: ActiveModules,
    pub decision: RedrawDecision,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn rendered(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Rendered)
    }
}

/// Decision phase only: layout and module list for a snapshot
pub fn plan(config: &PanelConfig, context: &MetricsSnapshot) -> (Resolution, ActiveModules) {
    let resolution = resolve(&config.triggers, &config.groups, context, &config.variables);
    let active = resolve_active_modules(
        &resolution.layout,
        &config.groups,
        &config.modules,
        config.fallback_module(),
    );
    (resolution, active)
}

/// Owns the display state and drives one cycle per interval
pub struct PanelDaemon<S, R> {
    config: PanelConfig,
    source: S,
    renderer: R,
    tracker: DisplayStateTracker,
    shutdown: ShutdownSignal,
    stats: CycleStats,
}

impl<S: MetricsSource, R: Renderer> PanelDaemon<S, R> {
    pub fn new(config: PanelConfig, source: S, renderer: R) -> Self {
        let tracker = DisplayStateTracker::new(config.redraw.clone());
        Self {
            config,
            source,
            renderer,
            tracker,
            shutdown: ShutdownSignal::new(),
            stats: CycleStats::default(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn tracker(&self) -> &DisplayStateTracker {
        &self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        self.run_cycle_at(Local::now())
    }

    /// One cycle at an explicit instant. A fetch failure skips the cycle and
    /// is returned as [`PanelError::ContextUnavailable`].
    pub fn run_cycle_at(&mut self, now: DateTime<Local>) -> Result<CycleReport> {
        self.stats.cycles += 1;

        let mut context = match self.source.fetch() {
            Ok(context) => context,
            Err(err) => {
                self.stats.fetch_failures += 1;
                return Err(match err {
                    PanelError::ContextUnavailable(_) => err,
                    other => PanelError::context_unavailable(other.to_string()),
                });
            }
        };

        if self.config.daemon.temporal_variables {
            enrich_temporal(&mut context, now);
        }

        let (resolution, active) = plan(&self.config, &context);
        self.stats.diagnostics += resolution.diagnostics.len() as u64;
        log::debug!("Layout {} -> {} module(s) from {}", resolution.layout, active.modules.len(), active.tier);

        let decision = self.tracker.should_render_at(now, &context, &resolution.layout);

        let outcome = if !decision.render {
            log::debug!("No redraw: {}", decision);
            self.stats.unchanged += 1;
            CycleOutcome::Unchanged
        } else if self.shutdown.is_triggered() {
            log::info!("Redraw due ({}) but shutdown requested; not rendering", decision);
            CycleOutcome::ShutdownRequested
        } else {
            log::info!("Redraw: {}", decision);
            match self.dispatch(&active, &context) {
                Dispatch::Presented => {
                    self.tracker.update_state_at(now, &context, &resolution.layout);
                    self.stats.renders += 1;
                    CycleOutcome::Rendered
                }
                Dispatch::Failed(failures) => {
                    self.stats.render_failures += 1;
                    CycleOutcome::RenderFailed(failures)
                }
                Dispatch::Interrupted => {
                    log::info!("Shutdown requested mid-frame; frame abandoned");
                    CycleOutcome::ShutdownRequested
                }
            }
        };

        Ok(CycleReport {
            started_at: now,
            context,
            resolution,
            active,
            decision,
            outcome,
        })
    }

    // The shutdown flag is checked before every call that would start new
    // panel work, so a signal mid-frame abandons the frame unpresented.
    fn dispatch(&mut self, active: &ActiveModules, context: &MetricsSnapshot) -> Dispatch {
        if let Err(err) = self.renderer.begin_frame() {
            log::error!("Could not start frame: {}", err);
            return Dispatch::Failed(vec![err]);
        }

        let mut failures = Vec::new();
        for id in &active.modules {
            if self.shutdown.is_triggered() {
                return Dispatch::Interrupted;
            }
            let geometry = self
                .config
                .modules
                .get(id)
                .map(|m| m.geometry)
                .unwrap_or_default();
            if let Err(err) = self.renderer.render(id, &geometry, context) {
                log::error!("Render of '{}' failed: {}", id, err);
                failures.push(err);
            }
        }

        if !failures.is_empty() {
            return Dispatch::Failed(failures);
        }
        if self.shutdown.is_triggered() {
            return Dispatch::Interrupted;
        }
        match self.renderer.present() {
            Ok(()) => Dispatch::Presented,
            Err(err) => {
                log::error!("Could not present frame: {}", err);
                Dispatch::Failed(vec![err])
            }
        }
    }

    fn tick(&mut self) {
        match self.run_cycle() {
            Ok(report) => log::debug!("Cycle done: {:?}", report.outcome),
            Err(err) => log::warn!("Skipping cycle: {}", err),
        }
    }

    /// Run until shutdown is requested. Cycles never overlap: each runs to
    /// completion before the next tick is awaited.
    pub async fn run(&mut self) -> CycleStats {
        let mut ticker = interval(self.config.update_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut wake = self.shutdown.subscribe();

        log::info!(
            "Polling {} every {}s",
            self.source.describe(),
            self.config.daemon.update_interval_secs
        );

        loop {
            if self.shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if self.shutdown.is_triggered() {
                        break;
                    }
                    self.tick();
                }
                _ = wake.recv() => {
                    break;
                }
            }
        }

        log::info!("Stopped after {}", self.stats);
        self.stats.clone()
    }

    /// Drive [`run`](Self::run) on a current-thread runtime
    pub fn run_blocking(&mut self) -> Result<CycleStats> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(runtime.block_on(self.run()))
    }
}
