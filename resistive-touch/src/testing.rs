//! Test doubles: a byte-level XPT2046 panel and a shared fake time base.

use core::cell::Cell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_time::Instant;
use embedded_bus::BusTransport;
use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::sampler::RawSample;

const CMD_X: u8 = 0xD0;
const CMD_Y: u8 = 0x90;
const CMD_Z1: u8 = 0xB0;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    High(u16),
    Low(u16),
    Pressure,
}

/// Emulates the controller's answers byte by byte.
///
/// Every position read consumes one scripted position, every pressure read
/// one scripted pressure. When a script runs dry its last entry repeats.
pub struct FakePanel {
    positions: VecDeque<RawSample>,
    z_taps: VecDeque<(u16, u16)>,
    position: RawSample,
    taps: (u16, u16),
    phase: Phase,
    pub sent: Vec<u8>,
    pub depth: u8,
    pub acquires: usize,
    pub position_reads: usize,
    pub pressure_reads: usize,
}

impl FakePanel {
    pub fn new() -> Self {
        Self {
            positions: VecDeque::new(),
            z_taps: VecDeque::new(),
            position: RawSample::default(),
            taps: (0, 4095),
            phase: Phase::Idle,
            sent: Vec::new(),
            depth: 0,
            acquires: 0,
            position_reads: 0,
            pressure_reads: 0,
        }
    }

    pub fn push_position(&mut self, x: u16, y: u16) -> &mut Self {
        self.positions.push_back(RawSample::new(x, y));
        self
    }

    /// Scripts the two differential taps so that the biased read yields `pressure`.
    pub fn push_pressure(&mut self, pressure: u16) -> &mut Self {
        let taps = if pressure < 4095 {
            (0, 4095 - pressure)
        } else {
            (pressure - 4095, 0)
        };
        self.z_taps.push_back(taps);
        self
    }

    pub fn push_pressures(&mut self, pressures: &[u16]) -> &mut Self {
        for &pressure in pressures {
            self.push_pressure(pressure);
        }
        self
    }

    pub fn push_z_taps(&mut self, z1: u16, z2: u16) -> &mut Self {
        self.z_taps.push_back((z1, z2));
        self
    }

    /// Scripts one validation that succeeds at `pressure` with two identical
    /// position samples.
    pub fn push_steady_touch(&mut self, pressure: u16, x: u16, y: u16) -> &mut Self {
        self.push_pressures(&[pressure, pressure, pressure]);
        self.push_position(x, y).push_position(x, y)
    }

    fn start_position(&mut self) {
        if let Some(next) = self.positions.pop_front() {
            self.position = next;
        }
        self.position_reads += 1;
    }

    fn start_pressure(&mut self) {
        if let Some(next) = self.z_taps.pop_front() {
            self.taps = next;
        }
        self.pressure_reads += 1;
    }
}

impl BusTransport for FakePanel {
    type Error = Infallible;

    fn acquire(&mut self) -> Result<(), Infallible> {
        if self.depth == 0 {
            self.acquires += 1;
        }
        self.depth += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> Result<u8, Infallible> {
        assert!(self.depth > 0, "transfer outside an acquire/release bracket");
        self.sent.push(byte);

        let was_idle = matches!(self.phase, Phase::Idle | Phase::Pressure);
        let reply = match self.phase {
            Phase::High(value) => {
                self.phase = Phase::Low(value);
                (value >> 5) as u8
            }
            Phase::Low(value) => {
                self.phase = Phase::Idle;
                ((value & 0x1F) << 3) as u8
            }
            Phase::Idle | Phase::Pressure => 0,
        };

        match byte {
            CMD_X => {
                if was_idle {
                    self.start_position();
                }
                self.phase = Phase::High(self.position.x);
            }
            CMD_Y => self.phase = Phase::High(self.position.y),
            CMD_Z1 if was_idle => {
                self.start_pressure();
                self.phase = Phase::Pressure;
            }
            _ => {}
        }
        Ok(reply)
    }

    fn transfer16(&mut self, word: u16) -> Result<u16, Infallible> {
        assert!(self.depth > 0, "transfer outside an acquire/release bracket");
        self.sent.extend_from_slice(&word.to_be_bytes());
        let (z1, z2) = self.taps;
        let reply = if word == 0x00C0 { z1 << 3 } else { z2 << 3 };
        if word != 0x00C0 {
            self.phase = Phase::Idle;
        }
        Ok(reply)
    }
}

/// A time base shared between the fake clock and the fake delay.
#[derive(Clone, Default)]
pub struct FakeTime {
    now_ns: Rc<Cell<u64>>,
}

impl FakeTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}

impl DelayNs for FakeTime {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + ns as u64);
    }
}

impl Clock for FakeTime {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now_ns.get() / 1_000)
    }
}
