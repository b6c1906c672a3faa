//! Channel router
//!
//! Displays that share an address can be placed behind an addressable
//! switch, one per channel. Before a transaction reaches such a display the
//! router makes sure the switch points at its channel.
//!
//! The switch is a single piece of shared hardware, so the last selection is
//! cached here once for the whole bus rather than per device. A transaction
//! for the channel that is already selected does not touch the switch.
//!
//! Switch support is a runtime capability: a router built without a switch
//! passes direct devices through and refuses switched ones.

use log::{debug, warn};

use crate::device::Device;
use crate::error::TransportError;
use crate::registry::DeviceRegistry;
use crate::traits::switch::{ChannelSwitch, SWITCH_CHANNELS};

/// Last state commanded on the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Selection {
    /// All channels deselected
    Off,
    /// One channel selected
    Channel(u8),
}

/// Placeholder switch type for routers built without switch support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSwitch;

impl ChannelSwitch for NoSwitch {
    fn select(&mut self, _channel: Option<u8>) -> Result<(), panelbus_hal::OsError> {
        Err(panelbus_hal::OsError::UNKNOWN)
    }
}

/// Routes transactions through an optional channel switch
#[derive(Debug)]
pub struct ChannelRouter<S = NoSwitch> {
    switch: Option<S>,
    /// `None` until the first select, and again after a failed one
    selected: Option<Selection>,
}

impl<S: ChannelSwitch> ChannelRouter<S> {
    /// Create a router with a switch present
    pub fn new(switch: S) -> Self {
        Self {
            switch: Some(switch),
            selected: None,
        }
    }

    /// Create a router without switch support
    pub fn absent() -> Self {
        Self {
            switch: None,
            selected: None,
        }
    }

    /// Create a router from an optional switch
    pub fn from_option(switch: Option<S>) -> Self {
        Self {
            switch,
            selected: None,
        }
    }

    /// Check if a switch is available
    pub fn is_present(&self) -> bool {
        self.switch.is_some()
    }

    /// Last successful selection, if any
    pub fn selected(&self) -> Option<Selection> {
        self.selected
    }

    /// Ensure the switch points at `device`'s channel
    ///
    /// Direct devices pass through untouched. Fails with `RouterUnavailable`
    /// if the device needs the switch and it is absent or rejects the select.
    pub fn route(&mut self, device: &Device) -> Result<(), TransportError> {
        match device.channel() {
            None => Ok(()),
            Some(channel) => self.select(Selection::Channel(channel)),
        }
    }

    /// Look up `index` in `registry` and route to it
    ///
    /// An index outside the registry is refused with `InvalidTarget`
    /// before the switch is touched.
    pub fn route_index(
        &mut self,
        registry: &DeviceRegistry,
        index: usize,
    ) -> Result<Device, TransportError> {
        let device = *registry.device(index)?;
        self.route(&device)?;
        Ok(device)
    }

    /// Deselect every channel on the switch
    pub fn deselect_all(&mut self) -> Result<(), TransportError> {
        self.select(Selection::Off)
    }

    /// Take the switch out of the router, leaving it without switch support
    pub fn release(&mut self) -> Option<S> {
        self.selected = None;
        self.switch.take()
    }

    fn select(&mut self, selection: Selection) -> Result<(), TransportError> {
        let Some(switch) = self.switch.as_mut() else {
            warn!("Channel switch requested but no switch is present");
            return Err(TransportError::RouterUnavailable { os: None });
        };

        if self.selected == Some(selection) {
            return Ok(());
        }

        let channel = match selection {
            Selection::Off => None,
            Selection::Channel(channel) if channel < SWITCH_CHANNELS => Some(channel),
            Selection::Channel(channel) => {
                warn!("Switch channel {} out of range", channel);
                return Err(TransportError::RouterUnavailable { os: None });
            }
        };

        debug!("Selecting switch channel {:?}", channel);
        match switch.select(channel) {
            Ok(()) => {
                self.selected = Some(selection);
                Ok(())
            }
            Err(os) => {
                // The switch may be in any state now
                self.selected = None;
                Err(TransportError::RouterUnavailable { os: Some(os) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use heapless::Vec;
    use panelbus_hal::OsError;

    /// Mock switch recording every select
    #[derive(Default)]
    struct MockSwitch {
        selects: Vec<Option<u8>, 16>,
        fail: bool,
    }

    impl ChannelSwitch for MockSwitch {
        fn select(&mut self, channel: Option<u8>) -> Result<(), OsError> {
            if self.fail {
                return Err(OsError(121));
            }
            let _ = self.selects.push(channel);
            Ok(())
        }
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_config(
            &[
                DeviceConfig::behind_switch(1, 0x3C, 2),
                DeviceConfig::behind_switch(1, 0x3C, 2),
                DeviceConfig::behind_switch(1, 0x3C, 5),
                DeviceConfig::direct(1, 0x3D),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_same_channel_is_not_reselected() {
        let registry = registry();
        let mut router = ChannelRouter::new(MockSwitch::default());

        for index in [0, 1, 2, 0] {
            router.route_index(&registry, index).unwrap();
        }

        let switch = router.release().unwrap();
        assert_eq!(switch.selects.as_slice(), &[Some(2), Some(5), Some(2)]);
    }

    #[test]
    fn test_direct_device_skips_switch() {
        let registry = registry();
        let mut router = ChannelRouter::new(MockSwitch::default());

        router.route_index(&registry, 3).unwrap();
        assert_eq!(router.selected(), None);
        assert!(router.release().unwrap().selects.is_empty());
    }

    #[test]
    fn test_direct_device_without_switch() {
        let registry = registry();
        let mut router = ChannelRouter::<NoSwitch>::absent();
        assert!(router.route_index(&registry, 3).is_ok());
    }

    #[test]
    fn test_switched_device_without_switch() {
        let registry = registry();
        let mut router = ChannelRouter::<NoSwitch>::absent();
        assert_eq!(
            router.route_index(&registry, 0),
            Err(TransportError::RouterUnavailable { os: None })
        );
    }

    #[test]
    fn test_out_of_range_index_is_refused() {
        let registry = registry();
        let mut router = ChannelRouter::new(MockSwitch::default());

        assert_eq!(
            router.route_index(&registry, 4),
            Err(TransportError::InvalidTarget {
                index: 4,
                available: 4
            })
        );
        assert!(router.release().unwrap().selects.is_empty());
    }

    #[test]
    fn test_switch_failure_clears_cache() {
        let registry = registry();
        let mut router = ChannelRouter::new(MockSwitch::default());
        router.route_index(&registry, 0).unwrap();

        router.switch.as_mut().unwrap().fail = true;
        assert_eq!(
            router.route_index(&registry, 2),
            Err(TransportError::RouterUnavailable {
                os: Some(OsError(121))
            })
        );
        assert_eq!(router.selected(), None);

        // Recovered switch gets an explicit select even for the old channel
        router.switch.as_mut().unwrap().fail = false;
        router.route_index(&registry, 0).unwrap();
        let switch = router.release().unwrap();
        assert_eq!(switch.selects.as_slice(), &[Some(2), Some(2)]);
    }

    #[test]
    fn test_deselect_all_then_route() {
        let registry = registry();
        let mut router = ChannelRouter::new(MockSwitch::default());

        router.deselect_all().unwrap();
        assert_eq!(router.selected(), Some(Selection::Off));
        router.route_index(&registry, 2).unwrap();
        assert_eq!(router.selected(), Some(Selection::Channel(5)));

        let switch = router.release().unwrap();
        assert_eq!(switch.selects.as_slice(), &[None, Some(5)]);
    }
}
