//! Configuration loading for the navigator.
//!
//! Camera geometry, viewport size, storage location and log level are loaded
//! from `conf/config.toml` if present. Missing or invalid entries fall back to
//! defaults so navigation always starts.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{LogLevel, NavigatorConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("empty config parses");
        assert_eq!(config, NavigatorConfig::default());
        assert_eq!(config.record_spacing, 40.0);
        assert_eq!(config.smoothing_factor, 0.05);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = parse_config(
            r#"
            [camera]
            record_spacing = 25.0
            smoothing_factor = 0.1

            [logging]
            log_level = "trace"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.record_spacing, 25.0);
        assert_eq!(config.smoothing_factor, 0.1);
        assert_eq!(config.camera_altitude, 5.0);
        assert_eq!(config.log_level.as_filter_str(), "trace");
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let config = parse_config(
            r#"
            [camera]
            smoothing_factor = 7.0
            frame_interval_ms = 0
            record_spacing = -3.0

            [viewport]
            height = 0.0

            [storage]
            cache_dir = "  "
            "#,
        )
        .expect("valid config");

        assert_eq!(config.smoothing_factor, 1.0);
        assert_eq!(config.frame_interval_ms, 1);
        assert_eq!(config.record_spacing, 0.0);
        assert_eq!(config.viewport_height, 1.0);
        assert_eq!(config.cache_dir, ".cache");
    }

    #[test]
    fn serialize_then_parse_preserves_config() {
        let mut config = NavigatorConfig::default();
        config.camera_distance = 42.0;
        config.log_level = LogLevel::Warn;
        let text = serialize_config(&config).expect("serializes");
        assert!(text.contains("[camera]"));
        assert_eq!(parse_config(&text).expect("parses"), config);
    }

    #[test]
    fn invalid_toml_is_an_error_and_missing_file_falls_back() {
        assert!(parse_config("[camera\nrecord_spacing = ").is_err());
        let config = load_config(Path::new("/definitely/not/here/config.toml"));
        assert_eq!(config, NavigatorConfig::default());
    }
}
