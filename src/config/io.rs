use super::models::NavigatorConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> NavigatorConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return NavigatorConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            NavigatorConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<NavigatorConfig> {
    let tables: ConfigTables = toml::from_str(contents).context("Failed to parse config tables")?;
    Ok(NavigatorConfig::from(tables).sanitized())
}

pub fn serialize_config(config: &NavigatorConfig) -> Result<String> {
    toml::to_string(&ConfigTables::from(config)).context("Failed to serialize config")
}
