//! Blocking sleep abstraction

use core::time::Duration;

use crate::error::OsError;

/// Why a single sleep call returned before the full duration elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepError {
    /// Woken early by a signal; `remaining` is still owed
    Interrupted {
        /// Time left of the original request
        remaining: Duration,
    },
    /// Any other platform failure
    Os(OsError),
}

/// One-shot blocking sleep
///
/// Implementations block once and report early wake-ups instead of
/// retrying; resuming is the caller's decision.
pub trait Sleep {
    /// Block the calling thread for `duration`
    fn sleep(&mut self, duration: Duration) -> Result<(), SleepError>;
}

impl<T: Sleep + ?Sized> Sleep for &mut T {
    fn sleep(&mut self, duration: Duration) -> Result<(), SleepError> {
        (**self).sleep(duration)
    }
}
