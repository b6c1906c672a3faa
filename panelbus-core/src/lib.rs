//! Board-agnostic transport core for I2C display panels
//!
//! This crate contains everything between "send these bytes as a display
//! command" and the bus handle that performs the write:
//!
//! - Transaction buffer with a fixed capacity
//! - Bus transport driver (INIT / START / SEND / SET-AUX / END protocol)
//! - Interruption-safe timing primitive
//! - Channel router for displays behind an addressable switch
//! - Device registry and target selection policies
//! - Configuration and error types
//!
//! All operations are blocking and single-threaded. One START…END cycle is
//! expected to finish before the next begins.

#![no_std]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod device;
pub mod error;
pub mod registry;
pub mod router;
pub mod timing;
pub mod traits;
pub mod transport;

pub use buffer::{TransactionBuffer, TRANSACTION_CAPACITY};
pub use config::{DeviceConfig, MuxConfig, DEFAULT_MUX_ADDRESS};
pub use device::{Device, DeviceId};
pub use error::{ConfigError, TransportError};
pub use registry::{DeviceRegistry, TargetMode, TargetSelector, MAX_DEVICES};
pub use router::{ChannelRouter, NoSwitch, Selection};
pub use timing::{Delay, DelayUnit};
pub use traits::{ChannelSwitch, MessageSink};
pub use transport::{BusTransport, Message, TransportState};
