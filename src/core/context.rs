//! Time-derived variables added to each cycle's snapshot.

use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike};

use crate::core::metrics::{MetricValue, MetricsSnapshot};

pub const TIME_HOUR: &str = "time_hour";
pub const TIME_MONTH: &str = "time_month";
pub const TIME_WEEKDAY: &str = "time_weekday";
pub const IS_DAYLIGHT: &str = "is_daylight";

/// Hours counted as daylight when sunrise/sunset are not supplied
const DAYLIGHT_HOURS: std::ops::RangeInclusive<u32> = 6..=18;

/// Add `time_hour`, `time_month`, `time_weekday` (0 = Monday) and
/// `is_daylight`. Values the source already supplied are left alone.
///
/// Returns the keys that were added.
pub fn enrich_temporal(snapshot: &mut MetricsSnapshot, now: DateTime<Local>) -> Vec<&'static str> {
    let daylight = is_daylight(snapshot, now);
    let derived = [
        (TIME_HOUR, MetricValue::Number(f64::from(now.hour()))),
        (TIME_MONTH, MetricValue::Number(f64::from(now.month()))),
        (TIME_WEEKDAY, MetricValue::Number(f64::from(now.weekday().num_days_from_monday()))),
        (IS_DAYLIGHT, MetricValue::Bool(daylight)),
    ];

    let mut added = Vec::new();
    for (key, value) in derived {
        if !snapshot.contains(key) {
            snapshot.insert(key, value);
            added.push(key);
        }
    }
    added
}

fn is_daylight(snapshot: &MetricsSnapshot, now: DateTime<Local>) -> bool {
    let sunrise = snapshot.get("sunrise").and_then(MetricValue::as_text).and_then(parse_clock);
    let sunset = snapshot.get("sunset").and_then(MetricValue::as_text).and_then(parse_clock);

    match (sunrise, sunset) {
        (Some(rise), Some(set)) => {
            let time = now.time();
            rise <= time && time <= set
        }
        _ => {
            if snapshot.contains("sunrise") || snapshot.contains("sunset") {
                log::debug!("sunrise/sunset not usable; using fixed daylight hours");
            }
            DAYLIGHT_HOURS.contains(&now.hour())
        }
    }
}

/// Accepts `HH:MM`, `HH:MM:SS` and ISO datetimes such as `2026-03-10T06:42`
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let clock = text.rsplit_once('T').map_or(text, |(_, t)| t).trim();
    NaiveTime::parse_from_str(clock, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M:%S"))
        .ok()
}
