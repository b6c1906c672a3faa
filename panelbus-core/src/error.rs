//! Error types for the transport core

use core::fmt;

use panelbus_hal::OsError;

/// Reasons a device configuration is rejected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No devices configured; there is nothing to address
    NoDevices,
    /// More devices than the registry can hold
    TooManyDevices,
    /// Address does not fit in 7 bits
    InvalidAddress { index: usize, address: u8 },
    /// Switch channel outside 0-7
    InvalidChannel { index: usize, channel: u8 },
    /// Device sits behind a switch but no switch is available
    SwitchRequired { index: usize, channel: u8 },
    /// The switch could not be opened or reset at startup
    SwitchUnavailable,
}

/// Errors surfaced by the transport, router, timing and selection layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The bus device could not be opened
    ResourceUnavailable { bus: u8, os: OsError },
    /// The handle could not be bound to the device address
    AddressBindFailure { address: u8, os: OsError },
    /// SEND or END issued before a successful INIT
    NotInitialized,
    /// Short write or write error while flushing a transaction
    TransmissionFailure {
        written: usize,
        expected: usize,
        os: Option<OsError>,
    },
    /// The platform sleep failed for a reason other than an early wake
    TimingFailure { os: OsError },
    /// The switch is absent or did not accept the channel select
    RouterUnavailable { os: Option<OsError> },
    /// Target index is outside the configured registry
    InvalidTarget { index: usize, available: usize },
    /// Startup configuration is unusable
    ConfigurationError(ConfigError),
}

impl From<ConfigError> for TransportError {
    fn from(e: ConfigError) -> Self {
        TransportError::ConfigurationError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoDevices => write!(f, "no displays configured"),
            ConfigError::TooManyDevices => write!(f, "too many displays configured"),
            ConfigError::InvalidAddress { index, address } => {
                write!(f, "display {index}: address {address:#04x} is not a 7-bit address")
            }
            ConfigError::InvalidChannel { index, channel } => {
                write!(f, "display {index}: switch channel {channel} is outside 0-7")
            }
            ConfigError::SwitchRequired { index, channel } => write!(
                f,
                "display {index} requires switch channel {channel} but no switch is available"
            ),
            ConfigError::SwitchUnavailable => write!(
                f,
                "unable to initialise the channel switch; are the address and bus correct?"
            ),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ResourceUnavailable { bus, os } => {
                write!(f, "can't open bus {bus}: {os}")
            }
            TransportError::AddressBindFailure { address, os } => {
                write!(f, "can't set address {address:#04x}: {os}")
            }
            TransportError::NotInitialized => write!(f, "transport not initialized"),
            TransportError::TransmissionFailure {
                written,
                expected,
                os: Some(os),
            } => write!(f, "write failed after {written}/{expected} bytes: {os}"),
            TransportError::TransmissionFailure {
                written,
                expected,
                os: None,
            } => write!(f, "short write: {written}/{expected} bytes"),
            TransportError::TimingFailure { os } => write!(f, "can't sleep: {os}"),
            TransportError::RouterUnavailable { os: Some(os) } => {
                write!(f, "channel switch unavailable: {os}")
            }
            TransportError::RouterUnavailable { os: None } => {
                write!(f, "channel switch unavailable")
            }
            TransportError::InvalidTarget { index, available } => {
                write!(f, "target {index} out of range ({available} displays)")
            }
            TransportError::ConfigurationError(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TransportError::ConfigurationError(e) => Some(e),
            _ => None,
        }
    }
}
