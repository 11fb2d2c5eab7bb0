//! Raw-to-screen calibration: derivation, import/export and the transform.
//!
//! The calibration is exchanged with callers as eight `u16` values:
//!
//! | index | value |
//! |---|---|
//! | 0 | raw offset `x0` |
//! | 1 | raw span `x_span` |
//! | 2 | raw offset `y0` |
//! | 3 | raw span `y_span` |
//! | 4 | advisory centre X |
//! | 5 | advisory centre Y |
//! | 6 | rotate flag |
//! | 7 | invert flags (bit 0: X, bit 1: Y) |
//!
//! A nonzero rotate flag swaps the raw axes before scaling. Derived
//! calibrations always store `1` in that slot; stored calibration data relies
//! on this encoding, so the transform keeps the same polarity.

use embedded_bus::BusTransport;
use embedded_graphics::{
    pixelcolor::PixelColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
};
use embedded_hal::delay::DelayNs;
use log::info;

use crate::error::{CalibrationError, Error, IllegalCalibration};
use crate::sampler::{Pressure, RawSample, RawSampler};

/// Invert-flags bit for the screen X axis.
pub const INVERT_X: u16 = 0x01;
/// Invert-flags bit for the screen Y axis.
pub const INVERT_Y: u16 = 0x02;

/// The affine mapping from raw controller space to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationParameters {
    /// Raw value mapped to screen X = 0.
    pub x0: u16,
    /// Raw distance covering the screen width. Must be nonzero.
    pub x_span: u16,
    /// Raw value mapped to screen Y = 0.
    pub y0: u16,
    /// Raw distance covering the screen height. Must be nonzero.
    pub y_span: u16,
    /// Advisory raw centre X, not used by the transform.
    pub center_x: u16,
    /// Advisory raw centre Y, not used by the transform.
    pub center_y: u16,
    /// Feed raw Y into screen X and raw X into screen Y.
    pub rotate: bool,
    /// Mirror the resulting screen X.
    pub invert_x: bool,
    /// Mirror the resulting screen Y.
    pub invert_y: bool,
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self {
            x0: 300,
            x_span: 3500,
            y0: 350,
            y_span: 3600,
            center_x: 0,
            center_y: 0,
            rotate: false,
            invert_x: false,
            invert_y: false,
        }
    }
}

impl CalibrationParameters {
    /// Imports a stored parameter array.
    pub fn from_array(params: [u16; 8]) -> Self {
        Self {
            x0: params[0],
            x_span: params[1],
            y0: params[2],
            y_span: params[3],
            center_x: params[4],
            center_y: params[5],
            // The flag is a single byte on the wire.
            rotate: params[6] as u8 != 0,
            invert_x: params[7] & INVERT_X != 0,
            invert_y: params[7] & INVERT_Y != 0,
        }
    }

    /// Exports the parameter array for storage.
    pub fn to_array(&self) -> [u16; 8] {
        let mut invert = 0;
        if self.invert_x {
            invert |= INVERT_X;
        }
        if self.invert_y {
            invert |= INVERT_Y;
        }
        [
            self.x0,
            self.x_span,
            self.y0,
            self.y_span,
            self.center_x,
            self.center_y,
            self.rotate as u16,
            invert,
        ]
    }

    /// Derives parameters from raw samples taken at the four screen corners,
    /// in [`Corner::ORDER`].
    pub fn from_corners(samples: &[RawSample; 4]) -> Self {
        let [top_left, bottom_left, top_right, _bottom_right] = *samples;
        Self {
            x0: top_left.x,
            x_span: top_right.x.wrapping_sub(top_left.x),
            y0: top_left.y,
            y_span: bottom_left.y.wrapping_sub(top_left.y),
            center_x: ((top_left.x as u32 + top_right.x as u32) >> 1) as u16,
            center_y: ((top_left.y as u32 + bottom_left.y as u32) >> 1) as u16,
            rotate: true,
            invert_x: false,
            invert_y: false,
        }
    }

    /// Rejects parameters that cannot be applied.
    pub fn check(&self) -> Result<(), IllegalCalibration> {
        if self.x_span == 0 || self.y_span == 0 {
            return Err(IllegalCalibration);
        }
        Ok(())
    }

    /// Maps a raw sample onto a screen of the given size.
    ///
    /// Division truncates, so neighbouring raw values may land one pixel
    /// apart. The result is not clamped and can lie outside the screen.
    pub fn transform(&self, raw: RawSample, screen: Size) -> Result<Point, IllegalCalibration> {
        self.check()?;

        let (a, b) = if self.rotate {
            (raw.y, raw.x)
        } else {
            (raw.x, raw.y)
        };
        let width = screen.width as i32;
        let height = screen.height as i32;

        let mut x = (a as i32 - self.x0 as i32) * width / self.x_span as i32;
        let mut y = (b as i32 - self.y0 as i32) * height / self.y_span as i32;
        if self.invert_x {
            x = width - x;
        }
        if self.invert_y {
            y = height - y;
        }

        Ok(Point::new(x, y))
    }
}

/// Screen corners prompted during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Top-left corner.
    TopLeft,
    /// Bottom-left corner.
    BottomLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-right corner.
    BottomRight,
}

impl Corner {
    /// The order in which corners are prompted and samples are stored.
    pub const ORDER: [Corner; 4] = [
        Corner::TopLeft,
        Corner::BottomLeft,
        Corner::TopRight,
        Corner::BottomRight,
    ];

    /// Arrow strokes pointing into this corner of a `screen`-sized display.
    fn arrow(self, screen: Size, size: i32) -> [(Point, Point); 3] {
        let w = screen.width as i32;
        let h = screen.height as i32;
        match self {
            Corner::TopLeft => [
                (Point::new(0, 0), Point::new(0, size)),
                (Point::new(0, 0), Point::new(size, 0)),
                (Point::new(0, 0), Point::new(size, size)),
            ],
            Corner::BottomLeft => [
                (Point::new(0, h - size - 1), Point::new(0, h - 1)),
                (Point::new(0, h - 1), Point::new(size, h - 1)),
                (Point::new(size, h - size - 1), Point::new(0, h - 1)),
            ],
            Corner::TopRight => [
                (Point::new(w - size - 1, 0), Point::new(w - 1, 0)),
                (Point::new(w - size - 1, size), Point::new(w - 1, 0)),
                (Point::new(w - 1, size), Point::new(w - 1, 0)),
            ],
            Corner::BottomRight => [
                (Point::new(w - size - 1, h - size - 1), Point::new(w - 1, h - 1)),
                (Point::new(w - size - 1, h - 1), Point::new(w - 1, h - 1)),
                (Point::new(w - 1, h - size - 1), Point::new(w - 1, h - 1)),
            ],
        }
    }
}

/// Colours and arrow size of the calibration prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationStyle<C> {
    /// Arrow colour.
    pub foreground: C,
    /// Colour used to clear the corner squares.
    pub background: C,
    /// Arrow length in pixels.
    pub size: u32,
}

/// How a corner touch is captured during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CornerCapture {
    /// Take one raw sample per corner, without waiting for contact.
    #[default]
    AnySample,
    /// Wait for pressure above `threshold`, sample, then wait for release.
    /// Each wait gives up after `max_polls` pressure polls.
    Contact {
        /// Pressure that counts as contact.
        threshold: u16,
        /// Polls allowed for each wait.
        max_polls: u32,
        /// Delay between polls, in microseconds.
        poll_interval_us: u32,
    },
}

/// Clears the four corner squares and draws the arrow for `corner`.
pub fn draw_prompt<T, C>(
    display: &mut T,
    corner: Corner,
    style: &CalibrationStyle<C>,
) -> Result<(), T::Error>
where
    T: DrawTarget<Color = C>,
    C: PixelColor,
{
    clear_prompts(display, style)?;

    let screen = display.bounding_box().size;
    let stroke = PrimitiveStyle::with_stroke(style.foreground, 1);
    for (start, end) in corner.arrow(screen, style.size as i32) {
        Line::new(start, end).into_styled(stroke).draw(display)?;
    }
    Ok(())
}

/// Fills the four corner squares with the background colour.
pub fn clear_prompts<T, C>(display: &mut T, style: &CalibrationStyle<C>) -> Result<(), T::Error>
where
    T: DrawTarget<Color = C>,
    C: PixelColor,
{
    let screen = display.bounding_box().size;
    let w = screen.width as i32;
    let h = screen.height as i32;
    let s = style.size as i32;
    let square = Size::new_equal(style.size + 1);

    for top_left in [
        Point::new(0, 0),
        Point::new(0, h - s - 1),
        Point::new(w - s - 1, 0),
        Point::new(w - s - 1, h - s - 1),
    ] {
        display.fill_solid(&Rectangle::new(top_left, square), style.background)?;
    }
    Ok(())
}

/// Prompts for the four corners and derives the calibration from the
/// captured raw samples.
pub fn derive<BUS, D, T, C>(
    sampler: &mut RawSampler<BUS>,
    delay: &mut D,
    display: &mut T,
    style: &CalibrationStyle<C>,
    capture: CornerCapture,
) -> Result<CalibrationParameters, CalibrationError<BUS::Error, T::Error>>
where
    BUS: BusTransport,
    D: DelayNs,
    T: DrawTarget<Color = C>,
    C: PixelColor,
{
    let mut samples = [RawSample::default(); 4];

    for (corner, sample) in Corner::ORDER.into_iter().zip(samples.iter_mut()) {
        draw_prompt(display, corner, style).map_err(CalibrationError::Draw)?;
        *sample = capture_corner(sampler, delay, capture)?;
        info!("calibration {:?}: raw ({}, {})", corner, sample.x, sample.y);
    }
    clear_prompts(display, style).map_err(CalibrationError::Draw)?;

    let params = CalibrationParameters::from_corners(&samples);
    info!("derived calibration {:?}", params.to_array());
    Ok(params)
}

fn capture_corner<BUS, D>(
    sampler: &mut RawSampler<BUS>,
    delay: &mut D,
    capture: CornerCapture,
) -> Result<RawSample, Error<BUS::Error>>
where
    BUS: BusTransport,
    D: DelayNs,
{
    match capture {
        CornerCapture::AnySample => sampler.sample_raw(),
        CornerCapture::Contact {
            threshold,
            max_polls,
            poll_interval_us,
        } => {
            let poll = |p: &mut RawSampler<BUS>, d: &mut D, pressed: bool| {
                wait_for_pressure(p, d, max_polls, poll_interval_us, |z| (z > threshold) == pressed)
            };
            poll(sampler, delay, true)?;
            let sample = sampler.sample_raw()?;
            poll(sampler, delay, false)?;
            Ok(sample)
        }
    }
}

fn wait_for_pressure<BUS, D>(
    sampler: &mut RawSampler<BUS>,
    delay: &mut D,
    max_polls: u32,
    poll_interval_us: u32,
    mut done: impl FnMut(Pressure) -> bool,
) -> Result<(), Error<BUS::Error>>
where
    BUS: BusTransport,
    D: DelayNs,
{
    for _ in 0..max_polls {
        if done(sampler.sample_pressure()?) {
            return Ok(());
        }
        delay.delay_us(poll_interval_us);
    }
    Err(Error::CalibrationTimeout)
}
