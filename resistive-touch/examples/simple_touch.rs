//! Runs the touch session against a simulated XPT2046 panel on the host.
//!
//! The simulated panel reports a finger resting at a fixed raw position. The
//! example restores a calibration, polls the session a few times and drives
//! a button from the calibrated point, drawing it on a mock display.

use core::convert::Infallible;
use std::time::{Duration, Instant as HostInstant};

use embassy_time::Instant;
use embedded_bus::BusTransport;
use embedded_graphics::{mock_display::MockDisplay, pixelcolor::BinaryColor, prelude::*};
use embedded_hal::delay::DelayNs;
use resistive_touch::{Button, ButtonStyle, Clock, TouchConfig, TouchController};

const CMD_X: u8 = 0xD0;
const CMD_Z1: u8 = 0xB0;

/// Answers the controller's command sequences for one resting finger.
struct SimulatedPanel {
    x: u16,
    y: u16,
    pressure: u16,
    sent: Vec<u8>,
}

impl SimulatedPanel {
    fn new(x: u16, y: u16, pressure: u16) -> Self {
        Self {
            x,
            y,
            pressure,
            sent: Vec::new(),
        }
    }

    fn reply(&self, index: usize) -> u8 {
        let high = |v: u16| (v >> 5) as u8;
        let low = |v: u16| ((v & 0x1F) << 3) as u8;
        match (self.sent.first().copied(), index) {
            (Some(CMD_X), 7) => high(self.x),
            (Some(CMD_X), 8) => low(self.x),
            (Some(CMD_X), 15) => high(self.y),
            (Some(CMD_X), 16) => low(self.y),
            // Z1 carries the pressure, Z2 cancels the 4095 bias.
            (Some(CMD_Z1), 1..=2) => ((self.pressure << 3).to_be_bytes())[index - 1],
            (Some(CMD_Z1), 3..=4) => ((4095u16 << 3).to_be_bytes())[index - 3],
            _ => 0,
        }
    }
}

impl BusTransport for SimulatedPanel {
    type Error = Infallible;

    fn acquire(&mut self) -> Result<(), Infallible> {
        self.sent.clear();
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> Result<u8, Infallible> {
        self.sent.push(byte);
        Ok(self.reply(self.sent.len() - 1))
    }
}

struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

struct HostClock(HostInstant);

impl Clock for HostClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.0.elapsed().as_micros() as u64)
    }
}

fn main() {
    let panel = SimulatedPanel::new(2048, 1024, 600);
    let mut touch = TouchController::new(
        panel,
        HostDelay,
        HostClock(HostInstant::now()),
        Size::new(64, 64),
        TouchConfig::default(),
    );
    touch.import_calibration([0, 4096, 0, 4096, 2048, 2048, 0, 0]);

    let style = ButtonStyle {
        outline: BinaryColor::On,
        fill: BinaryColor::Off,
        text: BinaryColor::On,
        text_size: 1,
    };
    let mut button = Button::new_centered(Point::new(32, 16), Size::new(40, 20), style, "OK");
    let mut display = MockDisplay::new();
    display.set_allow_overdraw(true);

    for poll in 0..3 {
        match touch.read_default() {
            Ok(Some(point)) => {
                println!("poll {poll}: touch at ({}, {})", point.x, point.y);
                button.set_pressed(button.contains(point));
            }
            Ok(None) => {
                println!("poll {poll}: no touch");
                button.set_pressed(false);
            }
            Err(err) => {
                println!("poll {poll}: touch error {err:?}");
                return;
            }
        }

        if button.just_pressed() {
            println!("button pressed");
            if let Err(err) = button.render(&mut display, true, None) {
                println!("draw error {err:?}");
            }
        }
    }

    println!("calibration {:?}", touch.export_calibration());
}
