use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Default epoch: Wednesday, January 1, 2020 00:00:00 UTC
pub const EPOCH: Duration = Duration::from_millis(1_577_836_800_000);

/// A trait for time sources that return milliseconds since an epoch.
///
/// This abstraction allows plugging the system clock into a generator in
/// production and a scripted clock in tests.
///
/// # Example
///
/// ```
/// use seqid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;

    /// Returns the current time, or an error if it cannot be expressed as
    /// milliseconds since the epoch.
    ///
    /// Generators read the clock through this method. The default never
    /// fails.
    ///
    /// # Errors
    ///
    /// Implementation defined; [`WallClock`] reports
    /// [`Error::ClockBeforeEpoch`].
    fn try_current_millis(&self) -> Result<u64> {
        Ok(self.current_millis())
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn try_current_millis(&self) -> Result<u64> {
        (**self).try_current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn try_current_millis(&self) -> Result<u64> {
        (**self).try_current_millis()
    }
}

/// Wall-clock time source offset from a fixed epoch.
///
/// Every reading goes to `SystemTime::now()`, so adjustments to the system
/// clock are visible. That is the point: a generator must see a backwards
/// step to refuse issuing ids that would sort before ones it already handed
/// out.
///
/// A system clock set before the epoch is an error for generators
/// ([`Error::ClockBeforeEpoch`]); [`TimeSource::current_millis`] saturates
/// such readings to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock {
    epoch_millis: u64,
}

impl Default for WallClock {
    /// Constructs a wall clock aligned to [`EPOCH`].
    fn default() -> Self {
        Self::with_epoch(EPOCH)
    }
}

impl WallClock {
    /// Constructs a wall clock whose zero point is `epoch`, given as a
    /// [`Duration`] since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }

    /// The epoch, in milliseconds since the Unix epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }
}

impl WallClock {
    fn unix_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        Self::unix_millis().saturating_sub(self.epoch_millis)
    }

    fn try_current_millis(&self) -> Result<u64> {
        let unix_millis = Self::unix_millis();
        unix_millis
            .checked_sub(self.epoch_millis)
            .ok_or(Error::ClockBeforeEpoch {
                unix_millis,
                epoch_millis: self.epoch_millis,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_start_of_2020() {
        // 50 years of days between 1970 and 2020, 12 of them leap years
        let days = 50 * 365 + 12;
        assert_eq!(EPOCH.as_millis(), days * 86_400_000);
    }

    #[test]
    fn wall_clock_is_relative_to_epoch() {
        let clock = WallClock::default();
        let unix = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let now = clock.current_millis();
        let expected = unix.as_millis() as u64 - clock.epoch_millis();
        assert!(now.abs_diff(expected) < 1_000);
    }

    #[test]
    fn reading_before_epoch_is_an_error() {
        let clock = WallClock::with_epoch(Duration::from_millis(u64::MAX / 2));
        match clock.try_current_millis() {
            Err(Error::ClockBeforeEpoch {
                unix_millis,
                epoch_millis,
            }) => {
                assert_eq!(epoch_millis, u64::MAX / 2);
                assert!(unix_millis < epoch_millis);
            }
            other => panic!("expected a pre-epoch error, got {other:?}"),
        }
        assert_eq!(clock.current_millis(), 0);
    }

    #[test]
    fn reading_after_epoch_matches_infallible_path() {
        let clock = WallClock::default();
        let now = clock.try_current_millis().unwrap();
        assert!(now.abs_diff(clock.current_millis()) < 1_000);
    }
}
