//! Channel switch start-up
//!
//! When a switch is configured it is opened, bound and told to cut every
//! downstream channel off before any display is touched. Any failure on
//! that path is a configuration error for the whole process.

use log::error;

use panelbus_core::{ChannelRouter, ConfigError, MuxConfig};
use panelbus_drivers::mux::Tca9548a;
use panelbus_hal::BusProvider;

/// Router for the configured switch, or one without a switch
pub fn open_router<P>(
    provider: &mut P,
    mux: Option<MuxConfig>,
) -> Result<ChannelRouter<Tca9548a<P::Handle>>, ConfigError>
where
    P: BusProvider,
{
    let Some(mux) = mux else {
        return Ok(ChannelRouter::absent());
    };

    let switch = Tca9548a::open(provider, mux).map_err(|e| {
        error!("{e}");
        ConfigError::SwitchUnavailable
    })?;

    let mut router = ChannelRouter::new(switch);
    router.deselect_all().map_err(|e| {
        error!("can't deselect switch channels: {e}");
        ConfigError::SwitchUnavailable
    })?;
    Ok(router)
}
