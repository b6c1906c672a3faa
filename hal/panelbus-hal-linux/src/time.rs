//! `nanosleep(2)` based sleep

use std::io;
use std::time::Duration;

use panelbus_hal::{OsError, Sleep, SleepError};

/// One-shot `nanosleep` that returns the unslept time on `EINTR`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSleep;

impl Sleep for LinuxSleep {
    fn sleep(&mut self, duration: Duration) -> Result<(), SleepError> {
        let request = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        let mut remaining = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // SAFETY: both pointers refer to live, properly aligned timespecs.
        let ret = unsafe { libc::nanosleep(&request, &mut remaining) };
        if ret == 0 {
            return Ok(());
        }

        let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
        if errno == libc::EINTR {
            Err(SleepError::Interrupted {
                remaining: Duration::new(remaining.tv_sec as u64, remaining.tv_nsec as u32),
            })
        } else {
            Err(SleepError::Os(OsError(errno)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_sleep() {
        assert_eq!(LinuxSleep.sleep(Duration::ZERO), Ok(()));
    }

    #[test]
    fn test_sleep_blocks_for_duration() {
        let start = Instant::now();
        LinuxSleep.sleep(Duration::from_millis(5)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
