//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::MonitorSettings;
use crate::config::validation::validate_settings;
use crate::config::ConfigError;

/// Parse settings from TOML text and validate them.
pub fn parse_config(content: &str) -> Result<MonitorSettings, ConfigError> {
    let settings: MonitorSettings = toml::from_str(content)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}
