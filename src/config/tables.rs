use super::defaults;
use super::models::{LogLevel, NavigatorConfig};
use serde::Deserialize;

/// Sectioned on-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    camera: CameraConfig,
    #[serde(default)]
    viewport: ViewportConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for NavigatorConfig {
    fn from(tables: ConfigTables) -> Self {
        NavigatorConfig {
            record_spacing: tables.camera.record_spacing,
            camera_altitude: tables.camera.altitude,
            camera_distance: tables.camera.distance,
            smoothing_factor: tables.camera.smoothing_factor,
            frame_interval_ms: tables.camera.frame_interval_ms,
            viewport_height: tables.viewport.height,
            content_height_factor: tables.viewport.content_height_factor,
            cache_dir: tables.storage.cache_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&NavigatorConfig> for ConfigTables {
    fn from(config: &NavigatorConfig) -> Self {
        ConfigTables {
            camera: CameraConfig {
                record_spacing: config.record_spacing,
                altitude: config.camera_altitude,
                distance: config.camera_distance,
                smoothing_factor: config.smoothing_factor,
                frame_interval_ms: config.frame_interval_ms,
            },
            viewport: ViewportConfig {
                height: config.viewport_height,
                content_height_factor: config.content_height_factor,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct CameraConfig {
    #[serde(default = "defaults::default_record_spacing")]
    record_spacing: f64,
    #[serde(default = "defaults::default_camera_altitude")]
    altitude: f64,
    #[serde(default = "defaults::default_camera_distance")]
    distance: f64,
    #[serde(default = "defaults::default_smoothing_factor")]
    smoothing_factor: f64,
    #[serde(default = "defaults::default_frame_interval_ms")]
    frame_interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            record_spacing: defaults::default_record_spacing(),
            altitude: defaults::default_camera_altitude(),
            distance: defaults::default_camera_distance(),
            smoothing_factor: defaults::default_smoothing_factor(),
            frame_interval_ms: defaults::default_frame_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ViewportConfig {
    #[serde(default = "defaults::default_viewport_height")]
    height: f64,
    #[serde(default = "defaults::default_content_height_factor")]
    content_height_factor: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            height: defaults::default_viewport_height(),
            content_height_factor: defaults::default_content_height_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
