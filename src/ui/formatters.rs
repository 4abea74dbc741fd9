use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

use crate::core::layout::{ResolutionTier, NORMAL_GROUP};
use crate::core::metrics::MetricValue;

/// Format timestamp in human-readable format (YYYY-MM-DD HH:MM)
pub fn format_time(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

/// Color a metric value by kind
pub fn format_value(value: &MetricValue) -> ColoredString {
    match value {
        MetricValue::Number(_) => value.to_string().yellow(),
        MetricValue::Text(_) => value.to_string().green(),
        MetricValue::Bool(_) => value.to_string().magenta(),
    }
}

/// `true` in green, `false` in red
pub fn format_bool(value: bool) -> ColoredString {
    if value {
        "true".green().bold()
    } else {
        "false".red().bold()
    }
}

/// Group name; `normal` is dimmed so activated groups stand out
pub fn format_group(group: &str) -> ColoredString {
    if group == NORMAL_GROUP {
        group.dimmed()
    } else {
        group.cyan().bold()
    }
}

pub fn format_tier(tier: ResolutionTier) -> ColoredString {
    let label = tier.to_string();
    match tier {
        ResolutionTier::Dynamic => label.green(),
        ResolutionTier::Manual => label.yellow(),
        ResolutionTier::Fallback => label.red(),
    }
}

/// Left-align `text` in a column of `width` characters
pub fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_time() {
        let time = Local.with_ymd_and_hms(2026, 3, 10, 7, 5, 0).unwrap();
        assert_eq!(format_time(time), "2026-03-10 07:05");
    }

    #[test]
    fn test_plain_text_is_preserved() {
        colored::control::set_override(false);
        assert_eq!(format_value(&MetricValue::Text("rain".into())).to_string(), "'rain'");
        assert_eq!(format_bool(false).to_string(), "false");
        assert_eq!(format_group("precipActive").to_string(), "precipActive");
        assert_eq!(format_tier(ResolutionTier::Fallback).to_string(), "minimal fallback");
        colored::control::unset_override();
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("top", 6), "top   ");
        assert_eq!(pad("bottom_left", 6), "bottom_left");
    }
}
