// Command handlers module
pub mod check;
pub mod completions;
pub mod eval;
pub mod resolve;
pub mod run;

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::Path;

use crate::core::config::PanelConfig;
use crate::core::daemon::{JsonFileSource, MetricsSource};
use crate::core::metrics::MetricsSnapshot;

/// Load the config named by `--config`, or the default one
pub(crate) fn load_config(matches: &ArgMatches) -> Result<PanelConfig> {
    let path = matches.get_one::<String>("config").map(Path::new);
    let config = PanelConfig::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load config {}", p.display()),
        None => "Failed to load default config".to_string(),
    })?;
    Ok(config)
}

/// Read a metrics file once
pub(crate) fn load_metrics(path: &str) -> Result<MetricsSnapshot> {
    JsonFileSource::new(path)
        .fetch()
        .with_context(|| format!("Failed to read metrics from {}", path))
}
