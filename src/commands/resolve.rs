use anyhow::{Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;

use super::{load_config, load_metrics};
use crate::core::context::enrich_temporal;
use crate::core::daemon::plan;
use crate::core::layout::ActiveModules;
use crate::core::triggers::Resolution;
use crate::ui;

/// Run the decision phase once and print what the panel would show
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let metrics_path = matches
        .get_one::<String>("metrics")
        .context("--metrics is required")?;
    let mut context = load_metrics(metrics_path)?;

    if config.daemon.temporal_variables {
        let added = enrich_temporal(&mut context, Local::now());
        if !added.is_empty() {
            ui::dimmed(&format!("Added temporal variables: {}", added.join(", ")));
        }
    }

    let (resolution, active) = plan(&config, &context);
    print_resolution(&resolution, &active);
    Ok(())
}

pub fn print_resolution(resolution: &Resolution, active: &ActiveModules) {
    let width = resolution
        .layout
        .iter()
        .map(|(section, _)| section.len())
        .max()
        .unwrap_or(0);

    ui::heading("Layout");
    for (section, group) in resolution.layout.iter() {
        let winner = resolution
            .activations
            .iter()
            .find(|a| &a.section == section)
            .map(|a| format!("  (trigger '{}', priority {})", a.trigger_id, a.priority))
            .unwrap_or_default();
        println!("  {}  {}{}", ui::pad(section, width), ui::format_group(group), winner.dimmed());
    }

    if !resolution.fired.is_empty() {
        ui::heading("Triggers that held");
        for id in &resolution.fired {
            println!("  {} {}", "✓".green(), id);
        }
    }

    if resolution.has_diagnostics() {
        ui::heading("Diagnostics");
        for diagnostic in &resolution.diagnostics {
            println!("  {} {}", "✗".red(), diagnostic);
        }
    }

    ui::heading("Active modules");
    println!("  {} {}", "via".dimmed(), ui::format_tier(active.tier));
    for (i, id) in active.modules.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, id);
    }
}
