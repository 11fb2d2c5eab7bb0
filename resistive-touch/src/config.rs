//! Tuning parameters for touch validation and the touch session.

use embassy_time::Duration;

/// Pressure threshold used when the caller does not supply one.
pub const DEFAULT_THRESHOLD: u16 = 350;

/// Lowest pressure threshold the session will ever apply. Also the threshold
/// used while the post-press cool-down is active.
pub const MIN_THRESHOLD: u16 = 20;

/// Number of validation attempts per session read.
pub const VALIDATE_ATTEMPTS: u8 = 5;

/// Window after a confirmed press during which the threshold is relaxed.
pub const PRESS_COOLDOWN: Duration = Duration::from_millis(50);

/// Allowed difference, in raw units, between the two position samples of a
/// validation.
pub const POSITION_DEADBAND: u16 = 20;

/// Upper bound on pressure samples taken while waiting for the pressure to
/// settle.
pub const MAX_SETTLE_SAMPLES: u16 = 64;

/// Configuration parameters for a [`TouchController`](crate::TouchController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchConfig {
    /// Threshold used by [`TouchController::read_default`](crate::TouchController::read_default).
    pub default_threshold: u16,
    /// Floor applied to every threshold, and the threshold used during the cool-down.
    pub min_threshold: u16,
    /// Validation attempts per read. A single success reports a touch.
    pub attempts: u8,
    /// Cool-down armed after every confirmed press.
    pub press_cooldown: Duration,
    /// Maximum raw difference between the two position samples on either axis.
    pub position_deadband: u16,
    /// Pressure samples allowed before validation reports
    /// [`Error::SensorUnstable`](crate::Error::SensorUnstable).
    pub max_settle_samples: u16,
    /// Delay after every pressure sample of the settle loop.
    pub settle_delay_us: u32,
    /// Delay between the first position sample and the pressure re-check.
    pub recheck_delay_us: u32,
    /// Delay between the pressure re-check and the second position sample.
    pub resample_delay_us: u32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
            min_threshold: MIN_THRESHOLD,
            attempts: VALIDATE_ATTEMPTS,
            press_cooldown: PRESS_COOLDOWN,
            position_deadband: POSITION_DEADBAND,
            max_settle_samples: MAX_SETTLE_SAMPLES,
            settle_delay_us: 1_000,
            recheck_delay_us: 1_000,
            resample_delay_us: 2_000,
        }
    }
}
