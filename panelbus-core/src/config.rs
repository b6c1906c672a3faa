//! Static device configuration
//!
//! The configuration is read once at startup and never mutated. It is turned
//! into a [`DeviceRegistry`](crate::registry::DeviceRegistry), which is where
//! validation happens.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default address of a TCA9548A-style channel switch
pub const DEFAULT_MUX_ADDRESS: u8 = 0x70;

/// One display entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// Bus number
    pub bus: u8,
    /// 7-bit device address
    pub address: u8,
    /// Switch channel (0-7), or `None` when wired directly to the bus
    pub channel: Option<u8>,
}

impl DeviceConfig {
    /// A display wired directly to the bus
    pub const fn direct(bus: u8, address: u8) -> Self {
        Self {
            bus,
            address,
            channel: None,
        }
    }

    /// A display reached through switch channel `channel`
    pub const fn behind_switch(bus: u8, address: u8, channel: u8) -> Self {
        Self {
            bus,
            address,
            channel: Some(channel),
        }
    }
}

/// Channel switch location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuxConfig {
    /// Bus number
    pub bus: u8,
    /// 7-bit switch address
    pub address: u8,
}

impl MuxConfig {
    /// Switch at the default address on `bus`
    pub const fn on_bus(bus: u8) -> Self {
        Self {
            bus,
            address: DEFAULT_MUX_ADDRESS,
        }
    }
}
