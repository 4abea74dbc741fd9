use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::load_config;
use super::resolve::print_resolution;
use crate::core::config::PanelConfig;
use crate::core::daemon::{
    CycleOutcome, CycleReport, FrameFileRenderer, JsonFileSource, LogRenderer, PanelDaemon, Renderer,
};
use crate::error::PanelError;
use crate::ui;

/// Start the controller loop (or a single cycle with `--once`)
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = load_config(matches)?;

    if let Some(secs) = matches.get_one::<u64>("interval") {
        config.daemon.update_interval_secs = *secs;
        config.validate().context("Invalid --interval")?;
    }

    let metrics_path = matches
        .get_one::<String>("metrics")
        .context("--metrics is required")?;
    let source = JsonFileSource::new(metrics_path);
    let once = matches.get_flag("once");

    match matches.get_one::<String>("frame-out") {
        Some(path) if !matches.get_flag("dry-run") => drive(config, source, FrameFileRenderer::new(path), once),
        _ => {
            if !matches.get_flag("dry-run") {
                ui::warn("no --frame-out given; frames are only logged");
            }
            drive(config, source, LogRenderer::new(), once)
        }
    }
}

fn drive<R: Renderer>(config: PanelConfig, source: JsonFileSource, renderer: R, once: bool) -> Result<()> {
    let mut daemon = PanelDaemon::new(config, source, renderer);

    if once {
        let report = daemon.run_cycle().context("Cycle skipped")?;
        print_report(&report);
        if let CycleOutcome::RenderFailed(failures) = report.outcome {
            let count = failures.len();
            if let Some(first) = failures.into_iter().next() {
                return Err(PanelError::from(first))
                    .with_context(|| format!("{} render dispatch failure(s)", count));
            }
        }
        return Ok(());
    }

    daemon.shutdown_signal().install_ctrlc_handler()?;
    ui::info(&format!(
        "paneld running every {}s; press Ctrl-C to stop",
        daemon.config().daemon.update_interval_secs
    ));

    let stats = daemon.run_blocking()?;
    ui::success(&format!("Stopped: {}", stats));
    Ok(())
}

fn print_report(report: &CycleReport) {
    print_resolution(&report.resolution, &report.active);

    ui::heading("Redraw");
    println!("  {} {}", ui::format_time(report.started_at).dimmed(), report.decision);
    match &report.outcome {
        CycleOutcome::Rendered => println!("  {}", "rendered".green().bold()),
        CycleOutcome::Unchanged => println!("  {}", "skipped".dimmed()),
        CycleOutcome::ShutdownRequested => println!("  {}", "not rendered (shutting down)".yellow()),
        CycleOutcome::RenderFailed(failures) => {
            for failure in failures {
                ui::error(&format!("  ✗ {}", failure));
            }
        }
    }
}
