//! `/dev/i2c-N` bus access

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use panelbus_hal::{BusHandle, BusProvider, OsError};

/// Device node prefix; the bus number is appended
pub const DEFAULT_PREFIX: &str = "/dev/i2c-";

// I2C_SLAVE from <linux/i2c-dev.h>
nix::ioctl_write_int_bad!(i2c_set_slave, 0x0703);

fn os_error(e: io::Error) -> OsError {
    OsError(e.raw_os_error().unwrap_or(0))
}

/// Opens i2c-dev character devices
#[derive(Debug, Clone)]
pub struct LinuxI2c {
    prefix: PathBuf,
}

impl Default for LinuxI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxI2c {
    /// Provider for `/dev/i2c-<bus>`
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Provider for `<prefix><bus>`
    pub fn with_prefix(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Device node path for `bus`
    pub fn path(&self, bus: u8) -> PathBuf {
        let mut path = self.prefix.clone().into_os_string();
        path.push(bus.to_string());
        path.into()
    }
}

impl BusProvider for LinuxI2c {
    type Handle = LinuxI2cHandle;

    fn open(&mut self, bus: u8) -> Result<LinuxI2cHandle, OsError> {
        let path = self.path(bus);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(os_error)?;
        debug!("Opened {} as fd {}", path.display(), file.as_raw_fd());
        Ok(LinuxI2cHandle {
            file,
            path,
            address: None,
        })
    }
}

/// Open i2c-dev file descriptor; closed on drop
#[derive(Debug)]
pub struct LinuxI2cHandle {
    file: File,
    path: PathBuf,
    address: Option<u8>,
}

impl LinuxI2cHandle {
    /// Device node this handle was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Address bound with the last successful `bind`
    pub fn address(&self) -> Option<u8> {
        self.address
    }
}

impl BusHandle for LinuxI2cHandle {
    fn bind(&mut self, address: u8) -> Result<(), OsError> {
        // SAFETY: the fd is owned by `self.file` and open for the whole call;
        // I2C_SLAVE takes its argument by value.
        unsafe { i2c_set_slave(self.file.as_raw_fd(), libc::c_int::from(address)) }
            .map_err(|errno| OsError(errno as i32))?;
        self.address = Some(address);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, OsError> {
        trace!("{}: write {:02x?}", self.path.display(), data);
        self.file.write(data).map_err(os_error)
    }
}

impl Drop for LinuxI2cHandle {
    fn drop(&mut self) {
        debug!("Closing {}", self.path.display());
    }
}
