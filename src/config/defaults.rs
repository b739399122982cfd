pub(crate) fn default_record_spacing() -> f64 {
    40.0
}

pub(crate) fn default_camera_altitude() -> f64 {
    5.0
}

pub(crate) fn default_camera_distance() -> f64 {
    30.0
}

pub(crate) fn default_smoothing_factor() -> f64 {
    0.05
}

pub(crate) fn default_frame_interval_ms() -> u64 {
    16
}

pub(crate) fn default_viewport_height() -> f64 {
    900.0
}

pub(crate) fn default_content_height_factor() -> f64 {
    20.0
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
