use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::path::Path;

use super::load_metrics;
use crate::core::condition::{Condition, VariableRegistry};
use crate::core::config::PanelConfig;
use crate::core::metrics::{MetricValue, MetricsSnapshot};
use crate::ui;

/// Evaluate one condition against a metrics file and/or `--set` values
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let source = matches
        .get_one::<String>("condition")
        .context("Condition argument is required")?;

    let mut context = match matches.get_one::<String>("metrics") {
        Some(path) => load_metrics(path)?,
        None => MetricsSnapshot::new(),
    };
    if let Some(pairs) = matches.get_many::<String>("set") {
        for pair in pairs {
            let (key, value) = parse_assignment(pair)?;
            context.insert(key, value);
        }
    }

    // Variable declarations only come from an explicitly named config
    let registry = match matches.get_one::<String>("config") {
        Some(path) => PanelConfig::load(Some(Path::new(path)))
            .with_context(|| format!("Failed to load config {}", path))?
            .variables,
        None => VariableRegistry::new(),
    };

    let condition = Condition::parse(source).context("Condition does not parse")?;

    for name in condition.variables() {
        match context.get(&name) {
            Some(value) => println!("  {} = {}", name.dimmed(), ui::format_value(value)),
            None => println!("  {} = {}", name.dimmed(), "<not supplied>".red()),
        }
    }

    let result = condition
        .evaluate(&context, &registry)
        .context("Condition could not be evaluated")?;
    println!("{} -> {}", condition.source().white().bold(), ui::format_bool(result));

    Ok(())
}

/// Split `key=value`; the value is read as bool, number or text
fn parse_assignment(pair: &str) -> Result<(String, MetricValue)> {
    let Some((key, value)) = pair.split_once('=') else {
        bail!("Expected key=value, got '{}'", pair);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Missing variable name in '{}'", pair);
    }
    Ok((key.to_string(), MetricValue::parse_loose(value)))
}
