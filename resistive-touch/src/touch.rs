//! The touch session: cool-down, attempt voting and calibrated reads.

use embassy_time::Instant;
use embedded_bus::BusTransport;
use embedded_graphics::{
    pixelcolor::PixelColor,
    prelude::*,
    primitives::{ContainsPoint, Rectangle},
};
use embedded_hal::delay::DelayNs;
use log::{debug, trace};

use crate::calibration::{self, CalibrationParameters, CalibrationStyle, CornerCapture};
use crate::clock::Clock;
use crate::config::TouchConfig;
use crate::error::{CalibrationError, Error};
use crate::sampler::{Pressure, RawSample, RawSampler};
use crate::validate;

/// A polled resistive touch panel behind a [`BusTransport`].
///
/// The session owns the sampler, a delay provider and a clock, and holds the
/// active calibration together with the screen size it maps onto.
pub struct TouchController<BUS, D, CLK> {
    sampler: RawSampler<BUS>,
    delay: D,
    clock: CLK,
    screen: Size,
    calibration: CalibrationParameters,
    config: TouchConfig,
    press_cooldown_until: Option<Instant>,
    last_point: Option<Point>,
}

impl<BUS, D, CLK> TouchController<BUS, D, CLK>
where
    BUS: BusTransport,
    D: DelayNs,
    CLK: Clock,
{
    /// Creates a session for a screen of `screen` pixels, starting with the
    /// default calibration.
    pub fn new(bus: BUS, delay: D, clock: CLK, screen: Size, config: TouchConfig) -> Self {
        Self {
            sampler: RawSampler::new(bus),
            delay,
            clock,
            screen,
            calibration: CalibrationParameters::default(),
            config,
            press_cooldown_until: None,
            last_point: None,
        }
    }

    /// Releases the bus, the delay provider and the clock.
    pub fn release(self) -> (BUS, D, CLK) {
        (self.sampler.into_inner(), self.delay, self.clock)
    }

    /// Reads a calibrated touch position.
    ///
    /// `threshold` is raised to the configured minimum, and replaced by it
    /// while the cool-down of a previous press is running. The panel is
    /// validated `config.attempts` times; one success is enough and the first
    /// successful sample is reported. A point outside the screen is reported
    /// as no touch.
    pub fn read(&mut self, threshold: u16) -> Result<Option<Point>, Error<BUS::Error>> {
        let mut threshold = threshold.max(self.config.min_threshold);
        if self
            .press_cooldown_until
            .is_some_and(|until| self.clock.now() < until)
        {
            threshold = self.config.min_threshold;
        }

        let mut first: Option<RawSample> = None;
        let mut valid = 0;
        for _ in 0..self.config.attempts {
            if let Some(raw) = self.validate(threshold)? {
                valid += 1;
                first.get_or_insert(raw);
            }
        }

        let Some(raw) = first else {
            self.press_cooldown_until = None;
            return Ok(None);
        };
        debug!(
            "{}/{} validations at threshold {}",
            valid, self.config.attempts, threshold
        );

        self.press_cooldown_until = Some(self.clock.now() + self.config.press_cooldown);

        let point = self.calibration.transform(raw, self.screen)?;
        let on_screen = Rectangle::new(Point::zero(), self.screen).contains(point);
        if !on_screen {
            trace!("no touch: ({}, {}) is off screen", point.x, point.y);
            return Ok(None);
        }

        self.last_point = Some(point);
        Ok(Some(point))
    }

    /// [`read`](Self::read) with the configured default threshold.
    pub fn read_default(&mut self) -> Result<Option<Point>, Error<BUS::Error>> {
        self.read(self.config.default_threshold)
    }

    /// Runs one debounced raw validation, see [`validate::validate`].
    pub fn validate(&mut self, threshold: u16) -> Result<Option<RawSample>, Error<BUS::Error>> {
        validate::validate(&mut self.sampler, &mut self.delay, threshold, &self.config)
    }

    /// Reads one unvalidated raw position.
    pub fn sample_raw(&mut self) -> Result<RawSample, Error<BUS::Error>> {
        self.sampler.sample_raw()
    }

    /// Reads the pressure proxy, `0` without contact.
    pub fn sample_pressure(&mut self) -> Result<Pressure, Error<BUS::Error>> {
        self.sampler.sample_pressure()
    }

    /// Prompts for the four screen corners on `display` and makes the derived
    /// calibration the active one.
    pub fn calibrate<T, C>(
        &mut self,
        display: &mut T,
        style: &CalibrationStyle<C>,
        capture: CornerCapture,
    ) -> Result<CalibrationParameters, CalibrationError<BUS::Error, T::Error>>
    where
        T: DrawTarget<Color = C>,
        C: PixelColor,
    {
        let params =
            calibration::derive(&mut self.sampler, &mut self.delay, display, style, capture)?;
        self.calibration = params;
        Ok(params)
    }
}

impl<BUS, D, CLK> TouchController<BUS, D, CLK> {
    /// The active calibration.
    pub fn calibration(&self) -> CalibrationParameters {
        self.calibration
    }

    /// Replaces the active calibration.
    ///
    /// No validation happens here; a zero span is reported by the next
    /// successful [`read`](TouchController::read).
    pub fn set_calibration(&mut self, calibration: CalibrationParameters) {
        self.calibration = calibration;
    }

    /// Imports a stored calibration array.
    pub fn import_calibration(&mut self, params: [u16; 8]) {
        self.calibration = CalibrationParameters::from_array(params);
    }

    /// Exports the active calibration for storage.
    pub fn export_calibration(&self) -> [u16; 8] {
        self.calibration.to_array()
    }

    /// The screen size points are mapped onto.
    pub fn screen_size(&self) -> Size {
        self.screen
    }

    /// Updates the screen size, e.g. after the display was rotated.
    pub fn set_screen_size(&mut self, screen: Size) {
        self.screen = screen;
    }

    /// The last point reported by [`read`](TouchController::read).
    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    /// The session configuration.
    pub fn config(&self) -> &TouchConfig {
        &self.config
    }
}
