//! A rectangular, hit-testable touch button with press-state latches.

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_9X18},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::PixelColor,
    prelude::*,
    primitives::{ContainsPoint, PrimitiveStyle, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use heapless::String;

/// Maximum label length in characters.
pub const LABEL_LEN: usize = 9;

// Room for LABEL_LEN characters of up to four UTF-8 bytes each.
const LABEL_BYTES: usize = LABEL_LEN * 4;

/// Where the label's reference point sits relative to the rendered text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    /// Top edge, left end.
    TopLeft,
    /// Top edge, centred.
    TopCenter,
    /// Top edge, right end.
    TopRight,
    /// Vertical middle, left end.
    MiddleLeft,
    /// Vertical middle, centred.
    #[default]
    MiddleCenter,
    /// Vertical middle, right end.
    MiddleRight,
    /// Bottom edge, left end.
    BottomLeft,
    /// Bottom edge, centred.
    BottomCenter,
    /// Bottom edge, right end.
    BottomRight,
    /// Text baseline, left end.
    BaselineLeft,
    /// Text baseline, centred.
    BaselineCenter,
    /// Text baseline, right end.
    BaselineRight,
}

impl LabelAnchor {
    fn alignment(self) -> (Alignment, Baseline) {
        use LabelAnchor::*;
        let alignment = match self {
            TopLeft | MiddleLeft | BottomLeft | BaselineLeft => Alignment::Left,
            TopCenter | MiddleCenter | BottomCenter | BaselineCenter => Alignment::Center,
            TopRight | MiddleRight | BottomRight | BaselineRight => Alignment::Right,
        };
        let baseline = match self {
            TopLeft | TopCenter | TopRight => Baseline::Top,
            MiddleLeft | MiddleCenter | MiddleRight => Baseline::Middle,
            BottomLeft | BottomCenter | BottomRight => Baseline::Bottom,
            BaselineLeft | BaselineCenter | BaselineRight => Baseline::Alphabetic,
        };
        (alignment, baseline)
    }
}

/// Colours and text size of a [`Button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStyle<C> {
    /// Border colour.
    pub outline: C,
    /// Background colour.
    pub fill: C,
    /// Label colour.
    pub text: C,
    /// Text size multiplier: `1`, `2`, or `3` and above.
    pub text_size: u8,
}

impl<C> ButtonStyle<C> {
    fn font(&self) -> &'static MonoFont<'static> {
        match self.text_size {
            0 | 1 => &FONT_6X10,
            2 => &FONT_9X18,
            _ => &FONT_10X20,
        }
    }
}

/// A touch button.
///
/// The geometry is always stored as top-left corner plus size, whichever
/// constructor was used. Press state is only changed by
/// [`set_pressed`](Button::set_pressed), normally once per input poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Button<C> {
    area: Rectangle,
    style: ButtonStyle<C>,
    label: String<LABEL_BYTES>,
    label_anchor: LabelAnchor,
    label_offset: Point,
    curr_pressed: bool,
    last_pressed: bool,
}

impl<C: PixelColor> Button<C> {
    /// Creates a button centred on `center`.
    pub fn new_centered(center: Point, size: Size, style: ButtonStyle<C>, label: &str) -> Self {
        let mut button = Self::new_top_left(Point::zero(), size, style, label);
        button.init_centered(center, size, style, label);
        button
    }

    /// Creates a button with its top-left corner at `top_left`.
    pub fn new_top_left(top_left: Point, size: Size, style: ButtonStyle<C>, label: &str) -> Self {
        Self {
            area: Rectangle::new(top_left, size),
            style,
            label: bounded_label(label),
            label_anchor: LabelAnchor::default(),
            label_offset: Point::zero(),
            curr_pressed: false,
            last_pressed: false,
        }
    }

    /// Re-initialises geometry, style and label around `center`.
    ///
    /// Odd sizes put the extra pixel right of and below the centre. The label
    /// anchor and the press state are kept.
    pub fn init_centered(
        &mut self,
        center: Point,
        size: Size,
        style: ButtonStyle<C>,
        label: &str,
    ) {
        let top_left = center - Point::new((size.width / 2) as i32, (size.height / 2) as i32);
        self.init_top_left(top_left, size, style, label);
    }

    /// Re-initialises geometry, style and label from the top-left corner.
    ///
    /// The label anchor and the press state are kept.
    pub fn init_top_left(
        &mut self,
        top_left: Point,
        size: Size,
        style: ButtonStyle<C>,
        label: &str,
    ) {
        self.area = Rectangle::new(top_left, size);
        self.style = style;
        self.label = bounded_label(label);
    }

    /// Positions the label at the button centre plus `(dx, dy)`, anchored at
    /// `anchor`.
    pub fn set_label_anchor(&mut self, dx: i32, dy: i32, anchor: LabelAnchor) {
        self.label_offset = Point::new(dx, dy);
        self.label_anchor = anchor;
    }

    /// The stored label, at most [`LABEL_LEN`] characters.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The button style.
    pub fn style(&self) -> &ButtonStyle<C> {
        &self.style
    }

    /// Hit test, half-open: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        self.area.contains(point)
    }

    /// Records the pressed state of the current poll.
    pub fn set_pressed(&mut self, pressed: bool) {
        self.last_pressed = self.curr_pressed;
        self.curr_pressed = pressed;
    }

    /// Pressed in the current poll.
    pub fn is_pressed(&self) -> bool {
        self.curr_pressed
    }

    /// Pressed now, but not in the previous poll.
    pub fn just_pressed(&self) -> bool {
        self.curr_pressed && !self.last_pressed
    }

    /// Released now, but pressed in the previous poll.
    pub fn just_released(&self) -> bool {
        !self.curr_pressed && self.last_pressed
    }

    /// Draws the button.
    ///
    /// `inverted` swaps the outline and fill colours. `label` replaces the
    /// stored label for this call only.
    pub fn render<D>(
        &self,
        target: &mut D,
        inverted: bool,
        label: Option<&str>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = C>,
    {
        let (outline, fill) = if inverted {
            (self.style.fill, self.style.outline)
        } else {
            (self.style.outline, self.style.fill)
        };

        let size = self.area.size;
        let radius = size.width.min(size.height) / 4;
        let shape = RoundedRectangle::with_equal_corners(self.area, Size::new_equal(radius));
        shape.into_styled(PrimitiveStyle::with_fill(fill)).draw(target)?;
        shape
            .into_styled(PrimitiveStyle::with_stroke(outline, 1))
            .draw(target)?;

        let text = label.unwrap_or(self.label.as_str());
        if text.is_empty() {
            return Ok(());
        }
        let (alignment, baseline) = self.label_anchor.alignment();
        let text_style = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(baseline)
            .build();
        let character_style = MonoTextStyle::new(self.style.font(), self.style.text);
        Text::with_text_style(
            text,
            self.area.center() + self.label_offset,
            character_style,
            text_style,
        )
        .draw(target)?;

        Ok(())
    }
}

impl<C> Dimensions for Button<C> {
    fn bounding_box(&self) -> Rectangle {
        self.area
    }
}

impl<C> ContainsPoint for Button<C> {
    fn contains(&self, point: Point) -> bool {
        self.area.contains(point)
    }
}

fn bounded_label(label: &str) -> String<LABEL_BYTES> {
    let mut bounded = String::new();
    for c in label.chars().take(LABEL_LEN) {
        if bounded.push(c).is_err() {
            break;
        }
    }
    bounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::pixelcolor::BinaryColor;

    fn style() -> ButtonStyle<BinaryColor> {
        ButtonStyle {
            outline: BinaryColor::On,
            fill: BinaryColor::Off,
            text: BinaryColor::On,
            text_size: 1,
        }
    }

    fn display() -> MockDisplay<BinaryColor> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display
    }

    #[test]
    fn both_constructors_normalise_to_top_left() {
        let centered = Button::new_centered(Point::new(50, 40), Size::new(20, 10), style(), "A");
        let top_left = Button::new_top_left(Point::new(40, 35), Size::new(20, 10), style(), "A");

        assert_eq!(centered.bounding_box(), top_left.bounding_box());
        assert_eq!(centered.bounding_box().top_left, Point::new(40, 35));
    }

    #[test]
    fn odd_size_extends_right_and_down() {
        let button = Button::new_centered(Point::new(10, 10), Size::new(5, 3), style(), "");
        assert_eq!(button.bounding_box(), Rectangle::new(Point::new(8, 9), Size::new(5, 3)));
    }

    #[test]
    fn contains_is_half_open() {
        let button = Button::new_top_left(Point::new(40, 35), Size::new(20, 10), style(), "");

        assert!(button.contains(Point::new(40, 35)));
        assert!(button.contains(Point::new(59, 44)));
        assert!(!button.contains(Point::new(60, 44)));
        assert!(!button.contains(Point::new(59, 45)));
        assert!(!button.contains(Point::new(39, 35)));
        assert!(!button.contains(Point::new(40, 34)));
    }

    #[test]
    fn hit_test_through_the_region_traits() {
        let button = Button::new_top_left(Point::new(0, 0), Size::new(8, 8), style(), "");
        let region: &dyn ContainsPoint = &button;

        assert!(region.contains(Point::new(7, 7)));
        assert!(!region.contains(Point::new(8, 0)));
    }

    #[test]
    fn press_sequence_drives_the_latches() {
        let mut button = Button::new_top_left(Point::zero(), Size::new(8, 8), style(), "");
        assert!(!button.is_pressed() && !button.just_pressed() && !button.just_released());

        button.set_pressed(true);
        assert!(button.is_pressed() && button.just_pressed() && !button.just_released());

        button.set_pressed(true);
        assert!(button.is_pressed() && !button.just_pressed());

        button.set_pressed(false);
        assert!(!button.is_pressed() && button.just_released() && !button.just_pressed());

        button.set_pressed(false);
        assert!(!button.just_released());
    }

    #[test]
    fn queries_do_not_change_state() {
        let mut button = Button::new_top_left(Point::zero(), Size::new(8, 8), style(), "");
        button.set_pressed(true);

        for _ in 0..3 {
            assert!(button.just_pressed());
        }
    }

    #[test]
    fn init_keeps_press_state_and_anchor() {
        let mut button = Button::new_top_left(Point::zero(), Size::new(8, 8), style(), "A");
        button.set_label_anchor(2, -3, LabelAnchor::TopLeft);
        button.set_pressed(true);

        button.init_centered(Point::new(30, 30), Size::new(10, 10), style(), "B");

        assert!(button.is_pressed() && button.just_pressed());
        assert_eq!(button.label_anchor, LabelAnchor::TopLeft);
        assert_eq!(button.label_offset, Point::new(2, -3));
        assert_eq!(button.label(), "B");
    }

    #[test]
    fn long_labels_are_truncated() {
        let button = Button::new_top_left(Point::zero(), Size::new(8, 8), style(), "0123456789AB");
        assert_eq!(button.label(), "012345678");
    }

    #[test]
    fn label_bound_counts_characters_not_bytes() {
        let size = Size::new(8, 8);
        let accented = Button::new_top_left(Point::zero(), size, style(), "ééééééééééé");
        assert_eq!(accented.label(), "ééééééééé");

        let wide = Button::new_top_left(Point::zero(), size, style(), "🙂🙂🙂🙂🙂🙂🙂🙂🙂🙂");
        assert_eq!(wide.label().chars().count(), LABEL_LEN);
    }

    #[test]
    fn render_fills_then_outlines() {
        let button = Button::new_top_left(Point::new(4, 4), Size::new(40, 20), style(), "");
        let mut display = display();

        button.render(&mut display, false, None).unwrap();

        assert_eq!(display.get_pixel(Point::new(24, 4)), Some(BinaryColor::On));
        assert_eq!(display.get_pixel(Point::new(24, 14)), Some(BinaryColor::Off));
        // Rounded away.
        assert_eq!(display.get_pixel(Point::new(4, 4)), None);
    }

    #[test]
    fn inverted_render_swaps_outline_and_fill() {
        let button = Button::new_top_left(Point::new(4, 4), Size::new(40, 20), style(), "");
        let mut display = display();

        button.render(&mut display, true, None).unwrap();

        assert_eq!(display.get_pixel(Point::new(24, 4)), Some(BinaryColor::Off));
        assert_eq!(display.get_pixel(Point::new(24, 14)), Some(BinaryColor::On));
    }

    #[test]
    fn override_label_is_drawn_for_one_call_only() {
        let stored = Button::new_top_left(Point::new(4, 4), Size::new(40, 20), style(), "AB");
        let other = Button::new_top_left(Point::new(4, 4), Size::new(40, 20), style(), "ZZ");

        let mut expected = display();
        stored.render(&mut expected, false, None).unwrap();
        let mut overridden = display();
        other.render(&mut overridden, false, Some("AB")).unwrap();
        let mut plain = display();
        other.render(&mut plain, false, None).unwrap();

        assert_eq!(overridden, expected);
        assert_ne!(plain, expected);
        assert_eq!(other.label(), "ZZ");
    }

    #[test]
    fn label_is_drawn_in_the_text_colour() {
        let mut button = Button::new_top_left(Point::new(4, 4), Size::new(40, 20), style(), "");
        let mut blank = display();
        button.render(&mut blank, false, None).unwrap();

        button.init_top_left(Point::new(4, 4), Size::new(40, 20), style(), "W");
        let mut labelled = display();
        button.render(&mut labelled, false, None).unwrap();

        assert_ne!(labelled, blank);
    }
}
