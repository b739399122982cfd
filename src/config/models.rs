use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) const MIN_SMOOTHING_FACTOR: f64 = 0.001;
pub(crate) const MAX_SMOOTHING_FACTOR: f64 = 1.0;
pub(crate) const MIN_FRAME_INTERVAL_MS: u64 = 1;
pub(crate) const MAX_FRAME_INTERVAL_MS: u64 = 1000;

/// Navigator configuration; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct NavigatorConfig {
    #[serde(default = "crate::config::defaults::default_record_spacing")]
    pub record_spacing: f64,
    #[serde(default = "crate::config::defaults::default_camera_altitude")]
    pub camera_altitude: f64,
    #[serde(default = "crate::config::defaults::default_camera_distance")]
    pub camera_distance: f64,
    #[serde(default = "crate::config::defaults::default_smoothing_factor")]
    pub smoothing_factor: f64,
    #[serde(default = "crate::config::defaults::default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default = "crate::config::defaults::default_content_height_factor")]
    pub content_height_factor: f64,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig {
            record_spacing: crate::config::defaults::default_record_spacing(),
            camera_altitude: crate::config::defaults::default_camera_altitude(),
            camera_distance: crate::config::defaults::default_camera_distance(),
            smoothing_factor: crate::config::defaults::default_smoothing_factor(),
            frame_interval_ms: crate::config::defaults::default_frame_interval_ms(),
            viewport_height: crate::config::defaults::default_viewport_height(),
            content_height_factor: crate::config::defaults::default_content_height_factor(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl NavigatorConfig {
    /// Pull every runtime value back into a usable range.
    pub fn sanitized(mut self) -> Self {
        let fallback = NavigatorConfig::default();
        let finite_or = |value: f64, default: f64| if value.is_finite() { value } else { default };

        self.record_spacing = finite_or(self.record_spacing, fallback.record_spacing).max(0.0);
        self.camera_altitude = finite_or(self.camera_altitude, fallback.camera_altitude);
        self.camera_distance = finite_or(self.camera_distance, fallback.camera_distance);
        self.smoothing_factor = finite_or(self.smoothing_factor, fallback.smoothing_factor)
            .clamp(MIN_SMOOTHING_FACTOR, MAX_SMOOTHING_FACTOR);
        self.frame_interval_ms = self
            .frame_interval_ms
            .clamp(MIN_FRAME_INTERVAL_MS, MAX_FRAME_INTERVAL_MS);
        self.viewport_height = finite_or(self.viewport_height, fallback.viewport_height).max(1.0);
        self.content_height_factor =
            finite_or(self.content_height_factor, fallback.content_height_factor).max(1.0);
        if self.cache_dir.trim().is_empty() {
            self.cache_dir = fallback.cache_dir;
        }
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn content_height(&self) -> f64 {
        self.viewport_height * self.content_height_factor
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
