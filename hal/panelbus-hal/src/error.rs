//! Operating system error codes

use core::fmt;

/// Raw error code reported by the platform (an `errno` value on Linux)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OsError(pub i32);

impl OsError {
    /// Code used when the platform failed without reporting a cause
    pub const UNKNOWN: Self = Self(0);

    /// Get the raw error code
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl From<i32> for OsError {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "os error {}", self.0)
    }
}
