//! TCA9548A 8-channel I2C switch
//!
//! The switch has a single control register. Writing a byte selects every
//! channel whose bit is set; this driver only ever sets one bit, or none to
//! cut all downstream channels off.

use log::info;
use panelbus_core::traits::switch::SWITCH_CHANNELS;
use panelbus_core::{ChannelSwitch, MuxConfig, TransportError};
use panelbus_hal::{BusHandle, BusProvider, OsError};

/// `EINVAL`
const INVALID_ARGUMENT: OsError = OsError(22);
/// `EIO`
const IO_ERROR: OsError = OsError(5);

/// TCA9548A switch bound to its own bus handle
#[derive(Debug)]
pub struct Tca9548a<H> {
    handle: H,
}

impl<H: BusHandle> Tca9548a<H> {
    /// Wrap a handle and bind it to the switch address
    pub fn new(mut handle: H, address: u8) -> Result<Self, OsError> {
        handle.bind(address)?;
        Ok(Self { handle })
    }

    /// Open the switch described by `config` on `provider`
    pub fn open<P>(provider: &mut P, config: MuxConfig) -> Result<Self, TransportError>
    where
        P: BusProvider<Handle = H>,
    {
        let handle = provider
            .open(config.bus)
            .map_err(|os| TransportError::ResourceUnavailable {
                bus: config.bus,
                os,
            })?;
        let switch = Self::new(handle, config.address).map_err(|os| {
            TransportError::AddressBindFailure {
                address: config.address,
                os,
            }
        })?;
        info!(
            "Opened channel switch at {:#04x} on bus {}",
            config.address, config.bus
        );
        Ok(switch)
    }

    /// Control register value for a selection
    fn control_byte(channel: Option<u8>) -> Result<u8, OsError> {
        match channel {
            Some(channel) if channel < SWITCH_CHANNELS => Ok(1 << channel),
            Some(_) => Err(INVALID_ARGUMENT),
            None => Ok(0),
        }
    }

    /// Release the underlying handle
    pub fn into_inner(self) -> H {
        self.handle
    }
}

impl<H: BusHandle> ChannelSwitch for Tca9548a<H> {
    fn select(&mut self, channel: Option<u8>) -> Result<(), OsError> {
        let control = [Self::control_byte(channel)?];
        match self.handle.write(&control)? {
            1 => Ok(()),
            _ => Err(IO_ERROR),
        }
    }
}
