//! Configured display devices

/// Position of a device in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub usize);

impl DeviceId {
    /// Registry index
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One physical display
///
/// Devices are only created by the registry after validation, so the
/// address always fits in 7 bits and the channel is always 0-7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device {
    id: DeviceId,
    bus: u8,
    address: u8,
    channel: Option<u8>,
}

impl Device {
    pub(crate) const fn new(id: DeviceId, bus: u8, address: u8, channel: Option<u8>) -> Self {
        Self {
            id,
            bus,
            address,
            channel,
        }
    }

    /// Registry position
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Bus number
    pub const fn bus(&self) -> u8 {
        self.bus
    }

    /// 7-bit bus address
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Switch channel, `None` when not behind a switch
    pub const fn channel(&self) -> Option<u8> {
        self.channel
    }

    /// Check if this device is reached through the switch
    pub const fn is_switched(&self) -> bool {
        self.channel.is_some()
    }
}
