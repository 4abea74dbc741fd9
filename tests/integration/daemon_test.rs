use chrono::{DateTime, Local, TimeZone};
use paneld::core::config::PanelConfig;
use paneld::core::daemon::{CycleOutcome, FrameFileRenderer, JsonFileSource, PanelDaemon};
use paneld::core::display_state::RedrawReason;
use paneld::PanelError;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use super::fixtures::{write_metrics, WEATHER_CONFIG};

struct Panel {
    _dir: TempDir,
    metrics: PathBuf,
    frame: PathBuf,
    daemon: PanelDaemon<JsonFileSource, FrameFileRenderer>,
}

fn panel() -> Panel {
    let dir = TempDir::new().unwrap();
    let metrics = dir.path().join("metrics.json");
    let frame = dir.path().join("frame.json");
    write_metrics(&metrics, dry(20.0));

    let config = PanelConfig::from_json_str(WEATHER_CONFIG).unwrap();
    let daemon = PanelDaemon::new(config, JsonFileSource::new(&metrics), FrameFileRenderer::new(&frame));

    Panel {
        _dir: dir,
        metrics,
        frame,
        daemon,
    }
}

fn dry(temperature: f64) -> serde_json::Value {
    json!({
        "temperature": temperature,
        "weather_symbol": "cloudy",
        "precipitationNow": 0.0,
        "forecastPrecip2h": 0.0,
        "wind_speed": 3.0,
        "forecast": { "tomorrow": 9.0 }
    })
}

fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap()
}

fn frame_modules(panel: &Panel) -> Vec<String> {
    let frame: serde_json::Value = serde_json::from_str(&fs::read_to_string(&panel.frame).unwrap()).unwrap();
    frame["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_first_cycle_writes_frame() {
    let mut panel = panel();
    let report = panel.daemon.run_cycle_at(at(9, 0)).unwrap();

    assert!(report.rendered());
    assert_eq!(report.decision.reason, RedrawReason::InitialRender);
    assert_eq!(
        frame_modules(&panel),
        vec!["main_weather", "clock_module", "barometer_module", "tomorrow_forecast"]
    );
}

#[test]
fn test_unchanged_metrics_do_not_redraw() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();
    fs::remove_file(&panel.frame).unwrap();

    let report = panel.daemon.run_cycle_at(at(9, 1)).unwrap();
    assert!(matches!(report.outcome, CycleOutcome::Unchanged));
    assert_eq!(report.decision.reason.to_string(), "no change");
    assert!(!panel.frame.exists());
}

#[test]
fn test_small_temperature_drift_is_ignored() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();

    write_metrics(&panel.metrics, dry(19.95));
    let drift = panel.daemon.run_cycle_at(at(9, 1)).unwrap();
    assert!(!drift.rendered());

    write_metrics(&panel.metrics, dry(19.8));
    let change = panel.daemon.run_cycle_at(at(9, 2)).unwrap();
    assert!(change.rendered());
    assert_eq!(change.decision.reason.to_string(), "metric changed: temperature");
}

#[test]
fn test_rain_forecast_switches_layout() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();

    let mut rainy = dry(20.0);
    rainy["forecastPrecip2h"] = json!(0.5);
    write_metrics(&panel.metrics, rainy);

    let report = panel.daemon.run_cycle_at(at(9, 1)).unwrap();
    assert!(report.rendered());
    assert_eq!(report.decision.reason, RedrawReason::LayoutChanged);
    assert_eq!(
        frame_modules(&panel),
        vec!["main_weather", "clock_module", "precipitation_module"]
    );
}

#[test]
fn test_watchdog_forces_redraw() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();

    assert!(!panel.daemon.run_cycle_at(at(9, 30)).unwrap().rendered());

    let report = panel.daemon.run_cycle_at(at(9, 31)).unwrap();
    assert_eq!(report.decision.reason, RedrawReason::WatchdogExpired);
    assert!(report.rendered());
}

#[test]
fn test_missing_metrics_file_skips_cycle() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();
    let baseline = panel.daemon.tracker().state().cloned();

    fs::remove_file(&panel.metrics).unwrap();
    let err = panel.daemon.run_cycle_at(at(9, 40)).unwrap_err();

    assert!(matches!(err, PanelError::ContextUnavailable(_)));
    assert!(!err.is_fatal());
    assert_eq!(panel.daemon.tracker().state().cloned(), baseline);
    assert_eq!(panel.daemon.stats().fetch_failures, 1);
}

#[test]
fn test_stats_accumulate() {
    let mut panel = panel();
    panel.daemon.run_cycle_at(at(9, 0)).unwrap();
    panel.daemon.run_cycle_at(at(9, 1)).unwrap();
    panel.daemon.run_cycle_at(at(9, 2)).unwrap();

    let stats = panel.daemon.stats();
    assert_eq!(stats.cycles, 3);
    assert_eq!(stats.renders, 1);
    assert_eq!(stats.unchanged, 2);
}
