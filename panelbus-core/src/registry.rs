//! Device registry and target selection
//!
//! The registry is the ordered, fixed-at-startup list of displays. The
//! selector maps each incoming logical command onto one of them according
//! to the active [`TargetMode`].

use heapless::Vec;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::DeviceConfig;
use crate::device::{Device, DeviceId};
use crate::error::{ConfigError, TransportError};
use crate::traits::switch::SWITCH_CHANNELS;
use panelbus_hal::bus::MAX_ADDRESS;

/// Maximum number of configured displays
pub const MAX_DEVICES: usize = 16;

/// Ordered collection of validated devices
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: Vec<Device, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Validate a configuration list and build the registry
    ///
    /// `switch_present` tells whether the channel router has a switch; a
    /// device with a channel is rejected when it does not.
    pub fn from_config(
        configs: &[DeviceConfig],
        switch_present: bool,
    ) -> Result<Self, TransportError> {
        if configs.is_empty() {
            return Err(ConfigError::NoDevices.into());
        }

        let mut devices = Vec::new();
        for (index, config) in configs.iter().enumerate() {
            if config.address > MAX_ADDRESS {
                return Err(ConfigError::InvalidAddress {
                    index,
                    address: config.address,
                }
                .into());
            }
            if let Some(channel) = config.channel {
                if channel >= SWITCH_CHANNELS {
                    return Err(ConfigError::InvalidChannel { index, channel }.into());
                }
                if !switch_present {
                    return Err(ConfigError::SwitchRequired { index, channel }.into());
                }
            }

            let device = Device::new(DeviceId(index), config.bus, config.address, config.channel);
            devices
                .push(device)
                .map_err(|_| ConfigError::TooManyDevices)?;
        }

        Ok(Self { devices })
    }

    /// Number of devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Get a device by index
    pub fn get(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    /// Get a device by index, failing with `InvalidTarget` when out of range
    pub fn device(&self, index: usize) -> Result<&Device, TransportError> {
        self.devices.get(index).ok_or(TransportError::InvalidTarget {
            index,
            available: self.devices.len(),
        })
    }

    /// Iterate over all devices in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Check if any device needs the channel switch
    pub fn needs_switch(&self) -> bool {
        self.devices.iter().any(Device::is_switched)
    }
}

/// How incoming commands pick their display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetMode {
    /// Every command goes to device 0
    #[default]
    Single,
    /// Every command carries its own target index
    #[cfg_attr(feature = "serde", serde(rename = "each", alias = "per-message"))]
    PerMessage,
    /// A select-target command sets the device for all later commands
    Stateful,
}

/// Maps logical commands onto registry devices
#[derive(Debug, Clone)]
pub struct TargetSelector {
    registry: DeviceRegistry,
    mode: TargetMode,
    active: usize,
}

impl TargetSelector {
    /// Create a selector; the active target starts at device 0
    pub fn new(registry: DeviceRegistry, mode: TargetMode) -> Self {
        Self {
            registry,
            mode,
            active: 0,
        }
    }

    /// The registry being addressed
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Current addressing mode
    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// Switch addressing mode; applies from the next resolved command
    pub fn set_mode(&mut self, mode: TargetMode) {
        debug!("Target mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    /// Index latched by the last select-target command
    pub fn active(&self) -> usize {
        self.active
    }

    /// Handle a select-target command
    ///
    /// Out-of-range indices are rejected and leave the active target as is.
    /// The latch is kept in every mode but only read in `Stateful` mode.
    pub fn select(&mut self, index: usize) -> Result<&Device, TransportError> {
        self.registry.device(index)?;
        self.active = index;
        debug!("Active target {}", index);
        self.registry.device(index)
    }

    /// Put the latch back on device 0
    pub fn reset(&mut self) {
        self.active = 0;
    }

    /// Resolve the device a command addresses
    ///
    /// `target` is the command's leading target field, if it has one. It
    /// is required in `PerMessage` mode and ignored otherwise.
    pub fn resolve(&self, target: Option<usize>) -> Result<&Device, TransportError> {
        match self.mode {
            TargetMode::Single => self.registry.device(0),
            TargetMode::PerMessage => match target {
                Some(index) => self.registry.device(index),
                None => Err(TransportError::InvalidTarget {
                    index: usize::MAX,
                    available: self.registry.len(),
                }),
            },
            TargetMode::Stateful => self.registry.device(self.active),
        }
    }
}
