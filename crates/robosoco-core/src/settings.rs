//! Mission config files (TOML).
//!
//! Every key is optional; missing keys keep [`MissionConfig::default`]
//! values. A custom tunnel replaces the demo scenario:
//!
//! ```toml
//! seed = 11
//! max_ticks = 2000
//!
//! [tunnel]
//! length_m = 200.0
//!
//! [[objects]]
//! kind = "victim"
//! position = { x = 80.0, y = 3.0 }
//! detection_radius = 3.0
//! severity = "critical"
//! consciousness = "unconscious"
//! condition = "bleeding"
//!
//! [[objects]]
//! kind = "structural_hazard"
//! position = { x = 150.0, y = 4.0 }
//! risk_level = 5
//! radius = 6.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use robosoco_logic::config::{ConfigError, MissionConfig};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Parse and validate a TOML mission config.
pub fn parse_config(text: &str) -> Result<MissionConfig, SettingsError> {
    let config: MissionConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a mission config file.
pub fn load_config(path: &Path) -> Result<MissionConfig, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text)?;
    log::info!("[settings] loaded mission config from {}", path.display());
    Ok(config)
}
