//! Configuration file schema
//!
//! ```toml
//! bus = 1
//! target_mode = "stateful"
//!
//! [mux]
//! address = 0x70
//!
//! [[display]]
//! address = 0x3c
//! channel = 2
//!
//! [[display]]
//! address = 0x3c
//! channel = -1   # not behind the switch
//! ```

use anyhow::{bail, Result};
use serde::Deserialize;

use panelbus_core::{DeviceConfig, MuxConfig, TargetMode, DEFAULT_MUX_ADDRESS};

/// Bus used when neither the file nor the command line names one
pub const DEFAULT_BUS: u8 = 1;

/// Address of a typical SH1106 module
pub const DEFAULT_DISPLAY_ADDRESS: u8 = 0x3C;

/// Channel value meaning "not behind the switch"
pub const NO_CHANNEL: i8 = -1;

fn default_bus() -> u8 {
    DEFAULT_BUS
}

fn default_mux_address() -> u8 {
    DEFAULT_MUX_ADDRESS
}

fn default_display_address() -> u8 {
    DEFAULT_DISPLAY_ADDRESS
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Default bus for the switch and every display
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// Initial addressing mode
    #[serde(default)]
    pub target_mode: TargetMode,
    /// Channel switch, if fitted
    #[serde(default)]
    pub mux: Option<MuxEntry>,
    /// Displays in target index order
    #[serde(default, rename = "display")]
    pub displays: Vec<DisplayEntry>,
}

/// `[mux]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MuxEntry {
    /// Overrides the top-level bus
    #[serde(default)]
    pub bus: Option<u8>,
    #[serde(default = "default_mux_address")]
    pub address: u8,
}

/// `[[display]]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayEntry {
    /// Overrides the top-level bus
    #[serde(default)]
    pub bus: Option<u8>,
    #[serde(default = "default_display_address")]
    pub address: u8,
    /// Switch channel 0-7, or -1 / absent when wired directly
    #[serde(default)]
    pub channel: Option<i8>,
}

impl Default for AppConfig {
    /// One SH1106 at 0x3C on bus 1, no switch
    fn default() -> Self {
        Self {
            bus: DEFAULT_BUS,
            target_mode: TargetMode::Single,
            mux: None,
            displays: vec![DisplayEntry {
                bus: None,
                address: DEFAULT_DISPLAY_ADDRESS,
                channel: None,
            }],
        }
    }
}

impl AppConfig {
    /// Switch location, if one is configured
    pub fn mux_config(&self) -> Option<MuxConfig> {
        self.mux.map(|mux| MuxConfig {
            bus: mux.bus.unwrap_or(self.bus),
            address: mux.address,
        })
    }

    /// Display list in the form the registry validates
    ///
    /// Channel range and address width are checked by the registry; only
    /// negative channels other than -1 are rejected here.
    pub fn device_configs(&self) -> Result<Vec<DeviceConfig>> {
        self.displays
            .iter()
            .enumerate()
            .map(|(index, display)| {
                let channel = match display.channel {
                    None | Some(NO_CHANNEL) => None,
                    Some(c) if c >= 0 => Some(c as u8),
                    Some(c) => bail!("display {index}: invalid channel {c}"),
                };
                Ok(DeviceConfig {
                    bus: display.bus.unwrap_or(self.bus),
                    address: display.address,
                    channel,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_single_panel() {
        let config = AppConfig::default();
        assert_eq!(config.mux_config(), None);
        assert_eq!(
            config.device_configs().unwrap(),
            vec![DeviceConfig::direct(1, 0x3C)]
        );
    }

    #[test]
    fn test_parse_switched_displays() {
        let config: AppConfig = toml::from_str(
            r#"
            bus = 2
            target_mode = "each"

            [mux]
            address = 0x71

            [[display]]
            address = 0x3c
            channel = 2

            [[display]]
            channel = 5

            [[display]]
            bus = 3
            address = 0x3d
            channel = -1
            "#,
        )
        .unwrap();

        assert_eq!(config.target_mode, TargetMode::PerMessage);
        assert_eq!(
            config.mux_config(),
            Some(MuxConfig {
                bus: 2,
                address: 0x71
            })
        );
        assert_eq!(
            config.device_configs().unwrap(),
            vec![
                DeviceConfig::behind_switch(2, 0x3C, 2),
                DeviceConfig::behind_switch(2, 0x3C, 5),
                DeviceConfig::direct(3, 0x3D),
            ]
        );
    }

    #[test]
    fn test_mux_defaults() {
        let config: AppConfig = toml::from_str("[mux]\n[[display]]\nchannel = 0\n").unwrap();
        assert_eq!(config.mux_config(), Some(MuxConfig::on_bus(1)));
        assert_eq!(config.target_mode, TargetMode::Single);
    }

    #[test]
    fn test_negative_channel_rejected() {
        let config: AppConfig = toml::from_str("[[display]]\nchannel = -2\n").unwrap();
        assert!(config.device_configs().is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[[display]]\nmultiplexer = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_stateful_mode_name() {
        let config: AppConfig = toml::from_str("target_mode = \"stateful\"\n").unwrap();
        assert_eq!(config.target_mode, TargetMode::Stateful);
        assert!(config.displays.is_empty());
    }
}
