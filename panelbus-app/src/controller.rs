//! Display controller
//!
//! Owns the transport, the target selector and one panel driver per
//! configured display, and applies front end requests to them. Every
//! request runs to completion before the next is taken, so shutdown is
//! only ever observed between whole transactions.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};

use panelbus_core::{
    BusTransport, ChannelSwitch, Delay, DeviceId, TargetMode, TargetSelector, TransportError,
};
use panelbus_drivers::panel::Sh1106;
use panelbus_hal::{BusProvider, Sleep};

use crate::frontend::{DrawOp, Request};

/// Width of the identification stripe per target index
const ID_STRIPE_WIDTH: usize = 8;

/// Applies requests to the configured displays
pub struct Controller<P: BusProvider, S, D> {
    transport: BusTransport<P, S>,
    selector: TargetSelector,
    panels: Vec<Sh1106>,
    delay: Delay<D>,
}

impl<P, S, D> Controller<P, S, D>
where
    P: BusProvider,
    S: ChannelSwitch,
    D: Sleep,
{
    /// Create a controller with one panel per registry entry
    pub fn new(transport: BusTransport<P, S>, selector: TargetSelector, delay: Delay<D>) -> Self {
        let panels = selector.registry().iter().copied().map(Sh1106::new).collect();
        Self {
            transport,
            selector,
            panels,
            delay,
        }
    }

    /// Current addressing mode
    pub fn mode(&self) -> TargetMode {
        self.selector.mode()
    }

    /// The transport
    pub fn transport(&self) -> &BusTransport<P, S> {
        &self.transport
    }

    /// Bring every display up and draw the start-up frame
    ///
    /// A display that fails is logged and skipped; the others still come
    /// up. `running` is checked between displays and bring-up stops once it
    /// is cleared. Returns the number of displays that came up.
    pub fn bring_up(&mut self, running: &AtomicBool) -> usize {
        let count = self.panels.len();
        let mut ready = 0;
        for index in 0..count {
            if !running.load(Ordering::SeqCst) {
                info!("Bring-up stopped after {} of {} displays", index, count);
                break;
            }
            match self.bring_up_one(index, count > 1) {
                Ok(()) => {
                    info!("Display {} ready", index);
                    ready += 1;
                }
                Err(e) => error!("Display {} failed to initialise: {}", index, e),
            }
        }
        // Leave the latch where a fresh start would put it
        self.selector.reset();
        ready
    }

    fn bring_up_one(&mut self, index: usize, mark: bool) -> Result<(), TransportError> {
        self.selector.select(index)?;
        let panel = &mut self.panels[index];
        let sink = &mut self.transport;

        panel.init(sink, &mut self.delay)?;
        panel.set_power_save(sink, false)?;
        panel.clear_buffer();
        panel.set_pixel(0, 0, true);
        if mark {
            panel.invert_region(0, 0, ID_STRIPE_WIDTH * (index + 1));
        }
        panel.flush(sink)
    }

    /// Apply one front end request
    pub fn apply(&mut self, request: Request) -> Result<(), TransportError> {
        match request {
            Request::Target(index) => {
                self.selector.select(index)?;
                Ok(())
            }
            Request::TargetMode(mode) => {
                self.selector.set_mode(mode);
                Ok(())
            }
            Request::Draw { target, op } => {
                let id = self.selector.resolve(target)?.id();
                self.draw(id, op)
            }
        }
    }

    fn draw(&mut self, id: DeviceId, op: DrawOp) -> Result<(), TransportError> {
        let available = self.panels.len();
        let Some(panel) = self.panels.get_mut(id.index()) else {
            return Err(TransportError::InvalidTarget {
                index: id.index(),
                available,
            });
        };
        let sink = &mut self.transport;

        match op {
            DrawOp::Clear => {
                panel.clear_buffer();
                panel.flush(sink)
            }
            DrawOp::Pixel { x, y } => {
                panel.set_pixel(x, y, true);
                panel.flush(sink)
            }
            DrawOp::Invert(on) => panel.set_inverted(sink, on),
            DrawOp::Contrast(value) => panel.set_contrast(sink, value),
            DrawOp::Power(on) => panel.set_power_save(sink, !on),
            DrawOp::Flush => panel.flush(sink),
        }
    }

    /// Close every bus session and the switch handle
    pub fn shutdown(self) {
        let (_provider, mut router) = self.transport.into_parts();
        if router.release().is_some() {
            info!("Released channel switch");
        }
    }
}
