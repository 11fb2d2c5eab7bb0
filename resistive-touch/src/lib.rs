#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

//! A polled, blocking driver for XPT2046-class resistive touch panels.
//!
//! The driver reads raw X, Y and pressure values over a [`BusTransport`],
//! debounces them into one trustworthy sample, maps that sample onto the
//! screen with a per-device calibration and offers a hit-testable
//! [`Button`] widget built on the calibrated position.
//!
//! All time is injected: an `embedded-hal` [`DelayNs`] for the debounce
//! delays and a [`Clock`] for the post-press cool-down. With the
//! `embassy-time-driver` feature, `EmbassyClock` and `embassy_time::Delay`
//! cover both.
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use embedded_bus::{BracketDevice, SharedSpiBus};
//! use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
//! use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiBus};
//! use resistive_touch::{Button, ButtonStyle, Clock, TouchConfig, TouchController};
//!
//! fn touch_loop<SPI, CS, D, CLK, T>(
//!     spi: SPI,
//!     touch_cs: CS,
//!     delay: D,
//!     clock: CLK,
//!     display: &mut T,
//!     stored: [u16; 8],
//! ) where
//!     SPI: SpiBus,
//!     CS: OutputPin,
//!     D: DelayNs + Clone,
//!     CLK: Clock,
//!     T: DrawTarget<Color = Rgb565>,
//! {
//!     // The display driver takes another `BracketDevice` on `bus`, which
//!     // implements `SpiDevice`.
//!     let bus = Rc::new(SharedSpiBus::new(spi));
//!     let Ok(device) = BracketDevice::new(bus.clone(), touch_cs, delay.clone()) else {
//!         return;
//!     };
//!
//!     let screen = display.bounding_box().size;
//!     let mut touch = TouchController::new(device, delay, clock, screen, TouchConfig::default());
//!     // Restore a calibration stored by the application.
//!     touch.import_calibration(stored);
//!
//!     let style = ButtonStyle {
//!         outline: Rgb565::WHITE,
//!         fill: Rgb565::BLUE,
//!         text: Rgb565::WHITE,
//!         text_size: 2,
//!     };
//!     let mut ok = Button::new_centered(Point::new(120, 160), Size::new(80, 40), style, "OK");
//!     let _ = ok.render(display, false, None);
//!
//!     loop {
//!         let point = touch.read_default().ok().flatten();
//!         let hit = point.is_some_and(|p| ok.contains(p));
//!         ok.set_pressed(hit);
//!         if ok.just_pressed() {
//!             let _ = ok.render(display, true, None);
//!         }
//!         if ok.just_released() {
//!             let _ = ok.render(display, false, None);
//!         }
//!     }
//! }
//! ```
//!
//! [`BusTransport`]: embedded_bus::BusTransport
//! [`DelayNs`]: embedded_hal::delay::DelayNs

pub mod button;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod sampler;
pub mod touch;
pub mod validate;

#[cfg(test)]
mod testing;

pub use button::{Button, ButtonStyle, LabelAnchor};
pub use calibration::{CalibrationParameters, CalibrationStyle, Corner, CornerCapture};
#[cfg(feature = "embassy-time-driver")]
pub use clock::EmbassyClock;
pub use clock::Clock;
pub use config::TouchConfig;
pub use error::{CalibrationError, Error, IllegalCalibration};
pub use sampler::{Pressure, RawSample, RawSampler};
pub use touch::TouchController;
