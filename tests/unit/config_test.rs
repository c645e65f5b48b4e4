//! Unit tests for configuration loading and the device profile.

use bikelink::config::{load_config_from, save_config_to, AppConfig, DeviceProfile, Units};
use bikelink::protocol::StartStopOpcodes;

#[test]
fn test_default_profile() {
    let profile = DeviceProfile::default();

    assert_eq!(profile.start_stop, StartStopOpcodes::ControlPoint);
    assert_eq!(profile.command_interval_ms, 500);
    assert!(profile.range_override().is_none());
}

#[test]
fn test_range_override_requires_both_bounds() {
    let mut profile = DeviceProfile::default();
    profile.min_resistance = Some(1);
    assert!(profile.range_override().is_none());

    profile.max_resistance = Some(24);
    assert_eq!(profile.range_override(), Some((1, 24)));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config.scan_timeout_secs, 30);
    assert_eq!(config.device.command_interval_ms, 500);
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.scan_timeout_secs = 12;
    config.units = Units::Imperial;
    config.device.start_stop = StartStopOpcodes::Prefixed;
    config.device.min_resistance = Some(1);
    config.device.max_resistance = Some(16);
    config.device.command_interval_ms = 750;

    save_config_to(&path, &config).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded.scan_timeout_secs, 12);
    assert_eq!(loaded.units, Units::Imperial);
    assert_eq!(loaded.device.start_stop, StartStopOpcodes::Prefixed);
    assert_eq!(loaded.device.range_override(), Some((1, 16)));
    assert_eq!(loaded.device.command_interval_ms, 750);
}

#[test]
fn test_unit_conversion() {
    let (speed, unit) = Units::Imperial.convert_speed(32.2);
    assert!((speed - 20.0).abs() < 0.05);
    assert_eq!(unit, "mph");

    let (distance, unit) = Units::Metric.convert_distance(5.4);
    assert!((distance - 5.4).abs() < f32::EPSILON);
    assert_eq!(unit, "km");
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "scan_timeout_secs = \"soon\"").unwrap();

    assert!(load_config_from(&path).is_err());
}
