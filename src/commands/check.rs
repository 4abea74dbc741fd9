use anyhow::Result;
use clap::ArgMatches;
use colored::Colorize;

use super::load_config;
use crate::core::config::PanelConfig;
use crate::ui;

/// Validate the configuration and print what it declares
pub fn execute(matches: &ArgMatches) -> Result<()> {
    // Load errors are reported once, by main
    let config = load_config(matches)?;

    print_summary(&config);

    let broken = config.triggers.syntax_errors().len();
    println!();
    if broken == 0 {
        ui::success("✓ Configuration is valid");
    } else {
        ui::warn(&format!(
            "configuration is valid but {} trigger(s) have conditions that never fire",
            broken
        ));
    }
    Ok(())
}

fn print_summary(config: &PanelConfig) {
    ui::heading("Sections");
    for section in config.groups.iter() {
        ui::bold(&format!("  {}", section.name));
        for (group, modules) in &section.groups {
            println!("    {} {}", ui::format_group(group), format!("[{}]", modules.join(", ")).dimmed());
        }
    }

    ui::heading("Triggers");
    if config.triggers.is_empty() {
        ui::dimmed("  (none)");
    }
    for trigger in config.triggers.iter() {
        let def = &trigger.definition;
        let status = match trigger.condition() {
            Ok(_) => "✓".green(),
            Err(_) => "✗".red(),
        };
        println!(
            "  {} {} {} {}.{} {}",
            status,
            def.id.white().bold(),
            "->".dimmed(),
            def.target_section,
            ui::format_group(&def.activate_group),
            format!("(priority {})", def.priority).dimmed()
        );
        println!("      {}", def.condition);
        if let Err(err) = trigger.condition() {
            println!("      {}", err.to_string().red());
        }
        if !def.description.is_empty() {
            println!("      {}", def.description.dimmed());
        }
    }

    if !config.variables.is_empty() {
        ui::heading("Variables");
        for (name, spec) in config.variables.iter() {
            let fallback = spec
                .fallback
                .as_ref()
                .map(|v| ui::format_value(v).to_string())
                .unwrap_or_else(|| "no fallback".dimmed().to_string());
            println!("  {} ({})", name, fallback);
        }
    }

    ui::heading("Redraw");
    println!(
        "  every {}s, watchdog {} min, fallback module '{}'",
        config.daemon.update_interval_secs, config.daemon.watchdog_minutes, config.daemon.fallback_module
    );
    for metric in &config.redraw.tracked {
        println!("  {} {}", metric.key, format!("(tolerance {})", metric.tolerance).dimmed());
    }
}
