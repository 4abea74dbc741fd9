use paneld::core::config::PanelConfig;
use paneld::PanelError;
use tempfile::TempDir;

use super::fixtures::{write_file, WEATHER_CONFIG};

#[test]
fn test_config_loads_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "config.json", WEATHER_CONFIG);

    let config = PanelConfig::load(Some(&path)).unwrap();

    assert_eq!(config.modules.len(), 7);
    assert_eq!(config.groups.len(), 2);
    assert_eq!(config.triggers.len(), 2);
    assert_eq!(config.variables.len(), 2);
    assert_eq!(config.redraw.tracked.len(), 2);
    assert!(!config.daemon.temporal_variables);
}

#[test]
fn test_comment_keys_are_not_groups() {
    let config = PanelConfig::from_json_str(WEATHER_CONFIG).unwrap();
    let bottom = config.groups.section("bottom").unwrap();

    let names: Vec<&str> = bottom.groups.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["normal", "precipActive", "windActive"]);
}

#[test]
fn test_trigger_declaration_order_is_kept() {
    let config = PanelConfig::from_json_str(WEATHER_CONFIG).unwrap();
    let ids: Vec<(&str, usize)> = config
        .triggers
        .iter()
        .map(|t| (t.id(), t.declaration_index))
        .collect();
    assert_eq!(ids, vec![("strong_wind", 0), ("precipitation_active", 1)]);
}

#[test]
fn test_all_problems_reported_together() {
    let broken = WEATHER_CONFIG
        .replace(r#""normal": ["main_weather", "clock_module"]"#, r#""day": ["main_weather"]"#)
        .replace(r#""activateGroup": "windActive""#, r#""activateGroup": "gale""#)
        .replace(r#""fallbackModule": "status_module""#, r#""fallbackModule": "splash""#);

    let err = PanelConfig::from_json_str(&broken).unwrap_err();
    assert!(err.is_fatal());

    let PanelError::Config(msg) = err else {
        panic!("expected a configuration error");
    };
    assert!(msg.contains("section 'top' has no 'normal' group"), "{}", msg);
    assert!(msg.contains("trigger 'strong_wind' activates group 'gale'"), "{}", msg);
    assert!(msg.contains("fallback module 'splash'"), "{}", msg);
}

#[test]
fn test_bad_condition_still_loads() {
    let broken = WEATHER_CONFIG.replace("wind_speed >= 10", "wind_speed => 10");
    let config = PanelConfig::from_json_str(&broken).unwrap();

    let errors = config.triggers.syntax_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "strong_wind");
}

#[test]
fn test_config_load_nonexistent_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = PanelConfig::load(Some(&temp_dir.path().join("config.json"))).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_default_path_is_under_config_dir() {
    if let Ok(path) = PanelConfig::default_path() {
        assert!(path.ends_with("paneld/config.json"));
    }
}
