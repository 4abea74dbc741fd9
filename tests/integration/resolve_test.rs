use paneld::core::config::PanelConfig;
use paneld::core::daemon::plan;
use paneld::core::layout::ResolutionTier;
use paneld::core::metrics::MetricsSnapshot;
use paneld::core::triggers::TriggerFault;

use super::fixtures::WEATHER_CONFIG;

fn config() -> PanelConfig {
    PanelConfig::from_json_str(WEATHER_CONFIG).unwrap()
}

/// Same panel with the two bottom triggers declared in the opposite order
fn reversed_config() -> PanelConfig {
    let mut value: serde_json::Value = serde_json::from_str(WEATHER_CONFIG).unwrap();
    let triggers = value["triggers"].as_object().unwrap().clone();
    let mut reversed = serde_json::Map::new();
    for (id, trigger) in triggers.into_iter().rev() {
        reversed.insert(id, trigger);
    }
    value["triggers"] = serde_json::Value::Object(reversed);
    PanelConfig::from_value(value).unwrap()
}

#[test]
fn test_forecast_rain_activates_precipitation_group() {
    let context = MetricsSnapshot::new()
        .with("precipitationNow", 0.0)
        .with("forecastPrecip2h", 0.5)
        .with("wind_speed", 2.0);

    let (resolution, active) = plan(&config(), &context);

    assert_eq!(resolution.layout.group_for("top"), Some("normal"));
    assert_eq!(resolution.layout.group_for("bottom"), Some("precipActive"));
    assert_eq!(resolution.fired, vec!["precipitation_active"]);
    assert_eq!(active.tier, ResolutionTier::Dynamic);
    assert_eq!(
        active.modules,
        vec!["main_weather", "clock_module", "precipitation_module"]
    );
}

#[test]
fn test_threshold_is_inclusive_at_point_two() {
    let at = |forecast: f64| {
        let context = MetricsSnapshot::new()
            .with("precipitationNow", 0.0)
            .with("forecastPrecip2h", forecast)
            .with("wind_speed", 0.0);
        let (resolution, _) = plan(&config(), &context);
        resolution.layout.group_for("bottom").map(String::from)
    };

    assert_eq!(at(0.2).as_deref(), Some("precipActive"));
    assert_eq!(at(0.19).as_deref(), Some("normal"));
}

#[test]
fn test_higher_priority_wins_in_either_order() {
    let context = MetricsSnapshot::new()
        .with("precipitationNow", 1.2)
        .with("forecastPrecip2h", 3.0)
        .with("wind_speed", 14.0);

    for config in [config(), reversed_config()] {
        let (resolution, _) = plan(&config, &context);
        assert_eq!(resolution.layout.group_for("bottom"), Some("precipActive"));
        assert_eq!(resolution.fired.len(), 2);
        assert_eq!(resolution.activations[0].priority, 100);
    }
}

#[test]
fn test_calm_dry_weather_is_normal() {
    let context = MetricsSnapshot::new()
        .with("precipitationNow", 0.0)
        .with("forecastPrecip2h", 0.0)
        .with("wind_speed", 3.0);

    let (resolution, active) = plan(&config(), &context);

    assert_eq!(resolution.layout.group_for("bottom"), Some("normal"));
    assert!(resolution.activations.is_empty());
    assert!(!resolution.has_diagnostics());
    assert_eq!(
        active.modules,
        vec!["main_weather", "clock_module", "barometer_module", "tomorrow_forecast"]
    );
}

#[test]
fn test_declared_fallbacks_cover_missing_metrics() {
    // Only precipitationNow supplied; forecastPrecip2h and wind_speed fall back to 0
    let context = MetricsSnapshot::new().with("precipitationNow", 0.0);
    let (resolution, _) = plan(&config(), &context);

    assert_eq!(resolution.layout.group_for("bottom"), Some("normal"));
    assert!(!resolution.has_diagnostics());
}

#[test]
fn test_undeclared_missing_metric_is_a_diagnostic() {
    // precipitationNow has no declaration and no value
    let context = MetricsSnapshot::new().with("wind_speed", 12.0);
    let (resolution, _) = plan(&config(), &context);

    assert_eq!(resolution.layout.group_for("bottom"), Some("windActive"));
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.diagnostics[0].trigger_id, "precipitation_active");
    assert!(matches!(resolution.diagnostics[0].fault, TriggerFault::Evaluation(_)));
}

#[test]
fn test_malformed_condition_does_not_break_resolution() {
    let broken = WEATHER_CONFIG.replace(
        "precipitationNow > 0 OR forecastPrecip2h >= 0.2",
        "precipitationNow > 0 OR (forecastPrecip2h >= 0.2",
    );
    let config = PanelConfig::from_json_str(&broken).unwrap();
    let context = MetricsSnapshot::new()
        .with("precipitationNow", 4.0)
        .with("wind_speed", 11.0);

    let (resolution, _) = plan(&config, &context);

    assert_eq!(resolution.layout.len(), 2);
    assert_eq!(resolution.layout.group_for("bottom"), Some("windActive"));
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.diagnostics[0].trigger_id, "precipitation_active");
}

#[test]
fn test_resolution_is_repeatable() {
    let config = config();
    let context = MetricsSnapshot::new()
        .with("precipitationNow", 0.3)
        .with("wind_speed", 20.0);

    let (first, first_active) = plan(&config, &context);
    for _ in 0..5 {
        let (again, again_active) = plan(&config, &context);
        assert_eq!(again, first);
        assert_eq!(again_active, first_active);
    }
}
