//! Bus transport driver
//!
//! Turns the transport message protocol into framed bus transactions:
//!
//! ```text
//! Uninitialized ──INIT──► Ready ──START──► Buffering ──SEND*──► Buffering
//!                           ▲                                      │
//!                           └──────────────────END─────────────────┘
//! ```
//!
//! - `INIT(device)` opens the device's bus and binds its address, or reuses
//!   the session opened by an earlier INIT, and makes it the active session.
//! - `START` empties the transaction buffer.
//! - `SEND(bytes)` appends to the buffer; bytes past capacity are dropped.
//! - `SET-AUX(flag)` is accepted in every state and ignored: this bus has no
//!   separate command/data line.
//! - `END` routes the active device through the channel router and writes
//!   the buffer as one blocking transaction. Nothing is retried.
//!
//! Sessions stay open until [`BusTransport::release`],
//! [`BusTransport::release_all`] or drop.

use heapless::Vec;
use log::{debug, error, info, warn};
use panelbus_hal::{BusHandle, BusProvider};

use crate::buffer::TransactionBuffer;
use crate::device::{Device, DeviceId};
use crate::error::TransportError;
use crate::registry::MAX_DEVICES;
use crate::router::ChannelRouter;
use crate::traits::sink::MessageSink;
use crate::traits::switch::ChannelSwitch;

/// One transport protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// Open (or reuse) the session for a device and make it active
    Init(&'a Device),
    /// Begin a new transaction
    Start,
    /// Append payload bytes
    Send(&'a [u8]),
    /// Command/data line; no-op on this bus
    SetAux(bool),
    /// Flush the buffered transaction
    End,
}

/// Protocol state of the active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportState {
    /// No active session
    Uninitialized,
    /// Session open, no transaction in progress
    Ready,
    /// Transaction in progress
    Buffering,
}

/// Open handle for one device
#[derive(Debug)]
struct Session<H> {
    device: Device,
    handle: H,
}

/// Transport driver owning the bus sessions, router and transaction buffer
pub struct BusTransport<P: BusProvider, S = crate::router::NoSwitch> {
    provider: P,
    router: ChannelRouter<S>,
    sessions: Vec<Session<P::Handle>, MAX_DEVICES>,
    active: Option<DeviceId>,
    state: TransportState,
    buffer: TransactionBuffer,
}

impl<P, S> BusTransport<P, S>
where
    P: BusProvider,
    S: ChannelSwitch,
{
    /// Create a transport with no sessions open
    pub fn new(provider: P, router: ChannelRouter<S>) -> Self {
        Self {
            provider,
            router,
            sessions: Vec::new(),
            active: None,
            state: TransportState::Uninitialized,
            buffer: TransactionBuffer::new(),
        }
    }

    /// Current protocol state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Device of the active session
    pub fn active_device(&self) -> Option<&Device> {
        let id = self.active?;
        self.sessions
            .iter()
            .find(|s| s.device.id() == id)
            .map(|s| &s.device)
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Bytes buffered for the transaction in progress
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// The channel router
    pub fn router(&self) -> &ChannelRouter<S> {
        &self.router
    }

    /// The channel router, mutably
    pub fn router_mut(&mut self) -> &mut ChannelRouter<S> {
        &mut self.router
    }

    /// INIT: open or reuse the session for `device` and activate it
    ///
    /// On failure no session is active afterwards, so a following END cannot
    /// reach the previously active device by mistake.
    pub fn init(&mut self, device: &Device) -> Result<(), TransportError> {
        if self.sessions.iter().any(|s| s.device.id() == device.id()) {
            debug!("Reusing session for display {}", device.id().index());
            self.activate(device.id());
            return Ok(());
        }

        self.active = None;
        self.state = TransportState::Uninitialized;

        let mut handle = self.provider.open(device.bus()).map_err(|os| {
            error!("can't open i2c bus {}: {}", device.bus(), os);
            TransportError::ResourceUnavailable {
                bus: device.bus(),
                os,
            }
        })?;
        info!("Opened i2c bus {}", device.bus());

        handle.bind(device.address()).map_err(|os| {
            error!("can't set addr {:#04x}: {}", device.address(), os);
            TransportError::AddressBindFailure {
                address: device.address(),
                os,
            }
        })?;
        info!("Set i2c addr {:#04x}", device.address());

        if self
            .sessions
            .push(Session {
                device: *device,
                handle,
            })
            .is_err()
        {
            // Registry size bounds the session count
            return Err(TransportError::InvalidTarget {
                index: device.id().index(),
                available: MAX_DEVICES,
            });
        }

        self.activate(device.id());
        Ok(())
    }

    /// START: reset the transaction buffer
    pub fn start(&mut self) {
        self.buffer.reset();
        if self.state != TransportState::Uninitialized {
            self.state = TransportState::Buffering;
        }
    }

    /// SEND: append bytes to the transaction buffer
    ///
    /// Bytes beyond the buffer capacity are dropped without error.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.state == TransportState::Uninitialized {
            return Err(TransportError::NotInitialized);
        }

        let appended = self.buffer.append(bytes);
        if appended < bytes.len() {
            warn!(
                "Transaction buffer full, dropped {} of {} bytes",
                bytes.len() - appended,
                bytes.len()
            );
        }
        self.state = TransportState::Buffering;
        Ok(())
    }

    /// SET-AUX: ignored on this bus
    pub fn set_aux(&mut self, _flag: bool) {}

    /// END: route and write the buffered transaction
    ///
    /// The buffer is emptied whether or not the write succeeds.
    pub fn end(&mut self) -> Result<(), TransportError> {
        let id = self.active.ok_or(TransportError::NotInitialized)?;
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.device.id() == id)
            .ok_or(TransportError::NotInitialized)?;

        self.state = TransportState::Ready;
        let result = Self::flush(&mut self.router, session, self.buffer.as_slice());
        self.buffer.reset();
        result
    }

    /// Close the session for one device
    ///
    /// Returns true if a session was open.
    pub fn release(&mut self, id: DeviceId) -> bool {
        let Some(position) = self.sessions.iter().position(|s| s.device.id() == id) else {
            return false;
        };
        self.sessions.swap_remove(position);
        debug!("Released session for display {}", id.index());

        if self.active == Some(id) {
            self.active = None;
            self.state = TransportState::Uninitialized;
            self.buffer.reset();
        }
        true
    }

    /// Close every session
    pub fn release_all(&mut self) {
        if !self.sessions.is_empty() {
            debug!("Releasing {} sessions", self.sessions.len());
        }
        self.sessions.clear();
        self.active = None;
        self.state = TransportState::Uninitialized;
        self.buffer.reset();
    }

    /// Release all sessions and hand back the provider and router
    pub fn into_parts(mut self) -> (P, ChannelRouter<S>) {
        self.release_all();
        (self.provider, self.router)
    }

    fn activate(&mut self, id: DeviceId) {
        self.active = Some(id);
        self.state = TransportState::Ready;
        self.buffer.reset();
    }

    fn flush(
        router: &mut ChannelRouter<S>,
        session: &mut Session<P::Handle>,
        data: &[u8],
    ) -> Result<(), TransportError> {
        router.route(&session.device)?;

        let expected = data.len();
        match session.handle.write(data) {
            Ok(written) if written == expected => Ok(()),
            Ok(written) => {
                error!(
                    "can't write cmd {:#04x}: short write {}/{}",
                    data.first().copied().unwrap_or(0),
                    written,
                    expected
                );
                Err(TransportError::TransmissionFailure {
                    written,
                    expected,
                    os: None,
                })
            }
            Err(os) => {
                error!(
                    "can't write cmd {:#04x}: {}",
                    data.first().copied().unwrap_or(0),
                    os
                );
                Err(TransportError::TransmissionFailure {
                    written: 0,
                    expected,
                    os: Some(os),
                })
            }
        }
    }
}

impl<P, S> MessageSink for BusTransport<P, S>
where
    P: BusProvider,
    S: ChannelSwitch,
{
    fn handle(&mut self, message: Message<'_>) -> Result<(), TransportError> {
        match message {
            Message::Init(device) => self.init(device),
            Message::Start => {
                self.start();
                Ok(())
            }
            Message::Send(bytes) => self.send(bytes),
            Message::SetAux(flag) => {
                self.set_aux(flag);
                Ok(())
            }
            Message::End => self.end(),
        }
    }
}
