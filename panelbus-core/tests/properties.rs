//! Property tests for transaction framing and channel routing

use std::cell::RefCell;
use std::rc::Rc;

use panelbus_core::{
    BusTransport, ChannelRouter, ChannelSwitch, DeviceConfig, DeviceRegistry, MessageSink,
    NoSwitch, TRANSACTION_CAPACITY,
};
use panelbus_hal::{BusHandle, BusProvider, OsError};
use proptest::prelude::*;

#[derive(Default)]
struct Recorded {
    writes: Vec<Vec<u8>>,
    selects: Vec<Option<u8>>,
}

#[derive(Clone, Default)]
struct RecordingBus(Rc<RefCell<Recorded>>);

impl BusProvider for RecordingBus {
    type Handle = RecordingBus;

    fn open(&mut self, _bus: u8) -> Result<Self::Handle, OsError> {
        Ok(self.clone())
    }
}

impl BusHandle for RecordingBus {
    fn bind(&mut self, _address: u8) -> Result<(), OsError> {
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, OsError> {
        self.0.borrow_mut().writes.push(data.to_vec());
        Ok(data.len())
    }
}

impl ChannelSwitch for RecordingBus {
    fn select(&mut self, channel: Option<u8>) -> Result<(), OsError> {
        self.0.borrow_mut().selects.push(channel);
        Ok(())
    }
}

fn fragments(max_total: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..12), 0..12)
        .prop_filter("total within bound", move |f| {
            f.iter().map(Vec::len).sum::<usize>() <= max_total
        })
}

proptest! {
    #[test]
    fn sent_bytes_are_written_in_order(fragments in fragments(TRANSACTION_CAPACITY)) {
        let bus = RecordingBus::default();
        let registry = DeviceRegistry::from_config(&[DeviceConfig::direct(1, 0x3C)], false).unwrap();
        let mut transport = BusTransport::new(bus.clone(), ChannelRouter::<NoSwitch>::absent());

        transport.init(registry.get(0).unwrap()).unwrap();
        let slices: Vec<&[u8]> = fragments.iter().map(Vec::as_slice).collect();
        transport.transaction(&slices).unwrap();

        let expected: Vec<u8> = fragments.concat();
        prop_assert_eq!(&bus.0.borrow().writes, &vec![expected]);
    }

    #[test]
    fn overflow_writes_exactly_capacity(
        fragments in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..24), 1..10)
    ) {
        let total: usize = fragments.iter().map(Vec::len).sum();
        prop_assume!(total > TRANSACTION_CAPACITY);

        let bus = RecordingBus::default();
        let registry = DeviceRegistry::from_config(&[DeviceConfig::direct(1, 0x3C)], false).unwrap();
        let mut transport = BusTransport::new(bus.clone(), ChannelRouter::<NoSwitch>::absent());

        transport.init(registry.get(0).unwrap()).unwrap();
        let slices: Vec<&[u8]> = fragments.iter().map(Vec::as_slice).collect();
        prop_assert!(transport.transaction(&slices).is_ok());

        let expected: Vec<u8> = fragments.concat()[..TRANSACTION_CAPACITY].to_vec();
        prop_assert_eq!(&bus.0.borrow().writes, &vec![expected]);
    }

    #[test]
    fn switch_is_selected_only_on_channel_change(
        order in prop::collection::vec(0usize..4, 1..20)
    ) {
        let bus = RecordingBus::default();
        let registry = DeviceRegistry::from_config(
            &[
                DeviceConfig::behind_switch(1, 0x3C, 2),
                DeviceConfig::behind_switch(1, 0x3C, 2),
                DeviceConfig::behind_switch(1, 0x3C, 5),
                DeviceConfig::direct(1, 0x3D),
            ],
            true,
        )
        .unwrap();
        let mut transport = BusTransport::new(bus.clone(), ChannelRouter::new(bus.clone()));

        let mut expected = Vec::new();
        let mut last = None;
        for &index in &order {
            let device = registry.get(index).unwrap();
            if let Some(channel) = device.channel() {
                if last != Some(channel) {
                    expected.push(Some(channel));
                    last = Some(channel);
                }
            }
            transport.init(device).unwrap();
            transport.transaction(&[&[0x00]]).unwrap();
        }

        prop_assert_eq!(&bus.0.borrow().selects, &expected);
        prop_assert_eq!(bus.0.borrow().writes.len(), order.len());
    }
}
