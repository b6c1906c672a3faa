//! Addressed bus abstractions
//!
//! Models a bus reached through a character-device style handle: the handle
//! is opened by bus number, bound to one 7-bit peripheral address, and then
//! every write is one complete bus transaction to that peripheral.

use crate::error::OsError;

/// Highest valid 7-bit bus address
pub const MAX_ADDRESS: u8 = 0x7F;

/// An open handle to a bus, bound to at most one peripheral address
pub trait BusHandle {
    /// Bind this handle to a 7-bit peripheral address
    ///
    /// All subsequent writes on this handle go to `address`.
    fn bind(&mut self, address: u8) -> Result<(), OsError>;

    /// Perform one blocking write transaction
    ///
    /// Returns the number of bytes the platform accepted. A count lower than
    /// `data.len()` is a short write and is not retried here.
    fn write(&mut self, data: &[u8]) -> Result<usize, OsError>;
}

/// Opens handles to buses by bus number
pub trait BusProvider {
    /// Handle type produced by this provider
    type Handle: BusHandle;

    /// Open bus `bus`
    ///
    /// # Arguments
    /// * `bus` - Platform bus number (e.g. `1` for `/dev/i2c-1`)
    fn open(&mut self, bus: u8) -> Result<Self::Handle, OsError>;
}

impl<T: BusHandle + ?Sized> BusHandle for &mut T {
    fn bind(&mut self, address: u8) -> Result<(), OsError> {
        (**self).bind(address)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, OsError> {
        (**self).write(data)
    }
}
