use std::fs;
use std::path::{Path, PathBuf};

/// A two-section weather panel with competing bottom-section triggers
pub const WEATHER_CONFIG: &str = r#"{
    "_comment": "Weather panel used by the integration tests",
    "modules": {
        "main_weather":         { "enabled": true,  "coords": {"x": 0, "y": 0},   "size": {"width": 800, "height": 240} },
        "clock_module":         { "enabled": true,  "coords": {"x": 600, "y": 0}, "size": {"width": 200, "height": 60} },
        "barometer_module":     { "enabled": false, "coords": {"x": 0, "y": 240}, "size": {"width": 400, "height": 240} },
        "tomorrow_forecast":    { "enabled": false, "coords": {"x": 400, "y": 240}, "size": {"width": 400, "height": 240} },
        "precipitation_module": { "enabled": false, "coords": {"x": 0, "y": 240}, "size": {"width": 800, "height": 240} },
        "wind_module":          { "enabled": false, "coords": {"x": 0, "y": 240}, "size": {"width": 800, "height": 240} },
        "status_module":        { "enabled": false, "coords": {"x": 0, "y": 0},   "size": {"width": 800, "height": 480} }
    },
    "moduleGroups": {
        "top": {
            "normal": ["main_weather", "clock_module"]
        },
        "bottom": {
            "_comment": "precipitation outranks wind",
            "normal": ["barometer_module", "tomorrow_forecast"],
            "precipActive": ["precipitation_module", "clock_module"],
            "windActive": ["wind_module"]
        }
    },
    "triggers": {
        "strong_wind": {
            "condition": "wind_speed >= 10",
            "targetSection": "bottom",
            "activateGroup": "windActive",
            "priority": 80,
            "description": "Show wind details in a gale"
        },
        "precipitation_active": {
            "condition": "precipitationNow > 0 OR forecastPrecip2h >= 0.2",
            "targetSection": "bottom",
            "activateGroup": "precipActive",
            "priority": 100
        }
    },
    "variables": {
        "forecastPrecip2h": { "fallback": 0.0, "description": "Forecast precipitation, next 2h" },
        "wind_speed": { "fallback": 0.0 }
    },
    "trackedMetrics": {
        "temperature": { "tolerance": 0.1 },
        "weather_symbol": {}
    },
    "daemon": {
        "updateIntervalSecs": 60,
        "watchdogMinutes": 30,
        "fallbackModule": "status_module",
        "temporalVariables": false
    }
}"#;

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn write_metrics(path: &Path, metrics: serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(&metrics).unwrap()).unwrap();
}
