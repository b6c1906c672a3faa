//! Interruption-safe blocking delays
//!
//! Panel drivers ask for delays as a count of one of four units. The
//! platform [`Sleep`] may return early when a signal arrives; the delay
//! then sleeps again for whatever is left, until the full duration has
//! elapsed.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{error, trace};
use panelbus_hal::{Sleep, SleepError};

use crate::error::TransportError;

/// Delay granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayUnit {
    /// 1 ns
    Nanos,
    /// 100 ns
    HundredNanos,
    /// 10 µs
    TenMicros,
    /// 1 ms
    Millis,
}

impl DelayUnit {
    /// Length of one unit in nanoseconds
    pub const fn nanos(self) -> u64 {
        match self {
            DelayUnit::Nanos => 1,
            DelayUnit::HundredNanos => 100,
            DelayUnit::TenMicros => 10_000,
            DelayUnit::Millis => 1_000_000,
        }
    }

    /// Total duration of `count` units
    pub const fn duration(self, count: u32) -> Duration {
        Duration::from_nanos(self.nanos() * count as u64)
    }
}

/// Blocking delay built on a platform sleep
#[derive(Debug)]
pub struct Delay<S> {
    sleeper: S,
}

impl<S: Sleep> Delay<S> {
    /// Create a delay around a platform sleep
    pub fn new(sleeper: S) -> Self {
        Self { sleeper }
    }

    /// Block for `count` × `unit`
    pub fn delay(&mut self, unit: DelayUnit, count: u32) -> Result<(), TransportError> {
        self.sleep_for(unit.duration(count))
    }

    /// Block for `duration`, resuming after early wake-ups
    ///
    /// Any failure other than an early wake aborts the delay with
    /// `TimingFailure`.
    pub fn sleep_for(&mut self, duration: Duration) -> Result<(), TransportError> {
        let mut remaining = duration;
        loop {
            match self.sleeper.sleep(remaining) {
                Ok(()) => return Ok(()),
                Err(SleepError::Interrupted { remaining: left }) => {
                    trace!("Sleep interrupted, {:?} left", left);
                    remaining = left;
                }
                Err(SleepError::Os(os)) => {
                    error!("can't sleep: {}", os);
                    return Err(TransportError::TimingFailure { os });
                }
            }
        }
    }

    /// Consume the delay and return the platform sleep
    pub fn into_inner(self) -> S {
        self.sleeper
    }
}

impl<S: Sleep> DelayNs for Delay<S> {
    fn delay_ns(&mut self, ns: u32) {
        // DelayNs cannot report errors; sleep_for already logged it
        let _ = self.delay(DelayUnit::Nanos, ns);
    }

    fn delay_us(&mut self, us: u32) {
        let _ = self.sleep_for(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        let _ = self.delay(DelayUnit::Millis, ms);
    }
}
