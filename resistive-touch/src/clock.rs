//! Monotonic time source for the touch session's cool-down.

use embassy_time::Instant;

/// A monotonic millisecond-or-better clock.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

impl<T: Clock + ?Sized> Clock for &T {
    #[inline]
    fn now(&self) -> Instant {
        T::now(self)
    }
}

/// A [`Clock`] backed by the embassy time driver.
///
/// Pair it with `embassy_time::Delay` as the session's delay provider.
#[cfg(feature = "embassy-time-driver")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time-driver")]
impl Clock for EmbassyClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}
