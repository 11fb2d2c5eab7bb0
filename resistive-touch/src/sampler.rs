//! Raw X, Y and pressure acquisition for XPT2046-class controllers.

use embedded_bus::BusTransport;
use log::trace;

use crate::error::Error;

// Control bytes for differential 12-bit conversions.
const CMD_X: u8 = 0xD0;
const CMD_Y: u8 = 0x90;
const CMD_Z1: u8 = 0xB0;
// Sent as the low byte of the Z1 read-back word.
const CMD_Z2: u16 = 0x00C0;
const NOP: u8 = 0x00;

/// Conversions requested per axis. The controller's first answers after a
/// channel switch are unreliable, only the last one is kept.
const AXIS_CONVERSIONS: usize = 4;

// Electrical bias of the Z1/Z2 differential read. A biased result of exactly
// this value means the panel is not touched.
const Z_BIAS: i16 = 4095;

/// Pressure proxy read from the panel. `0` means no contact.
pub type Pressure = u16;

/// An uncalibrated position reading in controller ADC units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Raw X channel reading.
    pub x: u16,
    /// Raw Y channel reading.
    pub y: u16,
}

impl RawSample {
    /// Creates a raw sample.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both axes are within `deadband` of `other`.
    pub fn is_near(&self, other: &RawSample, deadband: u16) -> bool {
        self.x.abs_diff(other.x) <= deadband && self.y.abs_diff(other.y) <= deadband
    }
}

/// Issues the controller command sequences over a [`BusTransport`].
pub struct RawSampler<BUS> {
    bus: BUS,
}

impl<BUS: BusTransport> RawSampler<BUS> {
    /// Creates a sampler that owns `bus`.
    pub fn new(bus: BUS) -> Self {
        Self { bus }
    }

    /// Gives the bus back.
    pub fn into_inner(self) -> BUS {
        self.bus
    }

    /// Reads the raw position.
    ///
    /// The controller always answers, so without contact the result is noise
    /// rather than an error. Only transport failures are reported.
    pub fn sample_raw(&mut self) -> Result<RawSample, Error<BUS::Error>> {
        let sample = self
            .bus
            .bracket(|bus| -> Result<RawSample, BUS::Error> {
                bus.transfer(CMD_X)?;
                let x = convert(bus, CMD_X, CMD_Y)?;
                let y = convert(bus, CMD_Y, NOP)?;
                Ok(RawSample { x, y })
            })
            .map_err(Error::Bus)?;

        trace!("raw sample x={} y={}", sample.x, sample.y);
        Ok(sample)
    }

    /// Reads the pressure proxy, `0` when the panel is not touched.
    pub fn sample_pressure(&mut self) -> Result<Pressure, Error<BUS::Error>> {
        let (z1, z2) = self
            .bus
            .bracket(|bus| -> Result<(u16, u16), BUS::Error> {
                bus.transfer(CMD_Z1)?;
                let z1 = bus.transfer16(CMD_Z2)? >> 3;
                let z2 = bus.transfer16(0)? >> 3;
                Ok((z1, z2))
            })
            .map_err(Error::Bus)?;

        let tz = Z_BIAS.wrapping_add(z1 as i16).wrapping_sub(z2 as i16);
        if tz == Z_BIAS {
            return Ok(0);
        }
        Ok(tz as u16)
    }
}

/// Completes the conversion started by `cmd`, repeating it until
/// `AXIS_CONVERSIONS` results have been clocked out, and keeps the last one.
/// `next` is sent while the final low byte is read back.
fn convert<BUS: BusTransport>(bus: &mut BUS, cmd: u8, next: u8) -> Result<u16, BUS::Error> {
    for _ in 1..AXIS_CONVERSIONS {
        bus.transfer(NOP)?;
        bus.transfer(cmd)?;
    }
    let hi = bus.transfer(NOP)? as u16;
    let lo = bus.transfer(next)?;
    Ok((hi << 5) | (0x1F & (lo >> 3)) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePanel;

    #[test]
    fn raw_read_repeats_each_command_and_keeps_the_last_answer() {
        let mut panel = FakePanel::new();
        panel.push_position(1234, 3210);
        let mut sampler = RawSampler::new(&mut panel);

        let sample = sampler.sample_raw().unwrap();

        assert_eq!(sample, RawSample::new(1234, 3210));
        assert_eq!(
            panel.sent,
            vec![
                0xD0, 0x00, 0xD0, 0x00, 0xD0, 0x00, 0xD0, 0x00, 0x90, // X
                0x00, 0x90, 0x00, 0x90, 0x00, 0x90, 0x00, 0x00, // Y
            ]
        );
        assert_eq!(panel.acquires, 1);
        assert_eq!(panel.depth, 0);
    }

    #[test]
    fn raw_read_assembles_high_and_low_bits() {
        let mut panel = FakePanel::new();
        // 13-bit result: eight high bits followed by five low bits.
        panel.push_position(0x1FFF, 0x0021);
        let mut sampler = RawSampler::new(&mut panel);

        assert_eq!(sampler.sample_raw().unwrap(), RawSample::new(0x1FFF, 0x0021));
    }

    #[test]
    fn pressure_is_biased_difference_of_the_two_taps() {
        let mut panel = FakePanel::new();
        panel.push_pressure(420);
        let mut sampler = RawSampler::new(&mut panel);

        assert_eq!(sampler.sample_pressure().unwrap(), 420);
        assert_eq!(panel.sent, vec![0xB0, 0x00, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn biased_sentinel_reads_as_no_contact() {
        let mut panel = FakePanel::new();
        panel.push_z_taps(100, 100);
        let mut sampler = RawSampler::new(&mut panel);

        assert_eq!(sampler.sample_pressure().unwrap(), 0);
    }

    #[test]
    fn negative_pressure_wraps_like_the_controller_word() {
        let mut panel = FakePanel::new();
        panel.push_z_taps(0, 8000);
        let mut sampler = RawSampler::new(&mut panel);

        assert_eq!(sampler.sample_pressure().unwrap(), (4095i16 - 8000) as u16);
    }

    #[test]
    fn deadband_is_inclusive() {
        let a = RawSample::new(500, 600);
        assert!(a.is_near(&RawSample::new(520, 580), 20));
        assert!(!a.is_near(&RawSample::new(521, 600), 20));
        assert!(!a.is_near(&RawSample::new(500, 579), 20));
    }
}
