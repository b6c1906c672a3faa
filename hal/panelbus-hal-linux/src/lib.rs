//! Linux implementation of the panelbus HAL
//!
//! - [`i2c::LinuxI2c`] opens `/dev/i2c-<bus>` character devices and binds
//!   them with the `I2C_SLAVE` ioctl
//! - [`time::LinuxSleep`] wraps `nanosleep(2)` and reports early wake-ups

#![cfg(target_os = "linux")]

pub mod i2c;
pub mod time;

pub use i2c::{LinuxI2c, LinuxI2cHandle};
pub use time::LinuxSleep;
