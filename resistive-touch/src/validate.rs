//! Debouncing of raw touch samples.
//!
//! A single resistive-panel read is unreliable near contact onset and
//! lift-off. Validation waits for the pressure to settle, then cross-checks
//! two position samples taken a few milliseconds apart, with a pressure
//! re-check in between.

use embedded_bus::BusTransport;
use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::config::TouchConfig;
use crate::error::Error;
use crate::sampler::{Pressure, RawSample, RawSampler};

/// Produces one trustworthy raw position, or `None` when the panel is not
/// (reliably) touched.
///
/// Reports [`Error::SensorUnstable`] when the pressure keeps rising for more
/// than `config.max_settle_samples` samples.
pub fn validate<BUS, D>(
    sampler: &mut RawSampler<BUS>,
    delay: &mut D,
    threshold: u16,
    config: &TouchConfig,
) -> Result<Option<RawSample>, Error<BUS::Error>>
where
    BUS: BusTransport,
    D: DelayNs,
{
    let pressure = settle(sampler, delay, config)?;
    if pressure <= threshold {
        trace!("no touch: pressure {pressure} <= {threshold}");
        return Ok(None);
    }

    let first = sampler.sample_raw()?;

    delay.delay_us(config.recheck_delay_us);
    let pressure = sampler.sample_pressure()?;
    if pressure <= threshold {
        debug!("no touch: contact lifted mid-read, pressure {pressure}");
        return Ok(None);
    }

    delay.delay_us(config.resample_delay_us);
    let second = sampler.sample_raw()?;

    if !first.is_near(&second, config.position_deadband) {
        debug!(
            "no touch: unstable position ({}, {}) vs ({}, {})",
            first.x, first.y, second.x, second.y
        );
        return Ok(None);
    }

    Ok(Some(first))
}

/// Samples the pressure until a reading no longer exceeds its predecessor and
/// returns that reading.
fn settle<BUS, D>(
    sampler: &mut RawSampler<BUS>,
    delay: &mut D,
    config: &TouchConfig,
) -> Result<Pressure, Error<BUS::Error>>
where
    BUS: BusTransport,
    D: DelayNs,
{
    // Seeded so that at least one sample is taken.
    let mut previous: Pressure = 0;
    let mut current: Pressure = 1;
    let mut samples: u16 = 0;

    while current > previous {
        if samples >= config.max_settle_samples {
            warn!("pressure still rising after {samples} samples");
            return Err(Error::SensorUnstable);
        }
        previous = current;
        current = sampler.sample_pressure()?;
        samples += 1;
        delay.delay_us(config.settle_delay_us);
    }

    Ok(current)
}
