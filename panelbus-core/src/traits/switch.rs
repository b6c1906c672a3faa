//! Addressable channel switch

use panelbus_hal::OsError;

/// Number of downstream channels on the switch
pub const SWITCH_CHANNELS: u8 = 8;

/// A switch gating which downstream channel the bus reaches
pub trait ChannelSwitch {
    /// Select a channel
    ///
    /// - `Some(n)`: route the bus to channel `n` (0-7)
    /// - `None`: deselect every channel
    fn select(&mut self, channel: Option<u8>) -> Result<(), OsError>;
}

impl<T: ChannelSwitch + ?Sized> ChannelSwitch for &mut T {
    fn select(&mut self, channel: Option<u8>) -> Result<(), OsError> {
        (**self).select(channel)
    }
}
