//! Configuration file loading
//!
//! Reads the TOML display list from disk. Falls back to the built-in
//! single-panel default when no path is given.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use super::types::AppConfig;

/// Load the configuration from `path`, or the default when `None`
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path)
                .with_context(|| format!("can't read {}", path.display()))?;
            debug!("Read {} bytes of TOML", text.len());
            toml::from_str(&text).with_context(|| format!("can't parse {}", path.display()))?
        }
        None => {
            info!("No configuration file, using built-in defaults");
            AppConfig::default()
        }
    };

    log_config_summary(&config);
    Ok(config)
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &AppConfig) {
    debug!("  default bus {}", config.bus);
    debug!("  target mode {:?}", config.target_mode);
    match config.mux_config() {
        Some(mux) => debug!("  switch at {:#04x} on bus {}", mux.address, mux.bus),
        None => debug!("  no switch"),
    }
    debug!("  {} displays", config.displays.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelbus_core::TargetMode;
    use std::io::Write;

    #[test]
    fn test_load_default() {
        assert_eq!(load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "target_mode = \"stateful\"").unwrap();
        writeln!(file, "[[display]]").unwrap();
        writeln!(file, "address = 0x3d").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.target_mode, TargetMode::Stateful);
        assert_eq!(config.displays[0].address, 0x3D);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(error.to_string().contains("can't read"));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bus = \"one\"").unwrap();
        let error = load(Some(file.path())).unwrap_err();
        assert!(error.to_string().contains("can't parse"));
    }
}
