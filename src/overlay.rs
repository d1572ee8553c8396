//! Text drawn over the clock, such as the digital time. Each frame the
//! caller restores `bounds()` from the clock, then calls `compute` and
//! `render`.

use serde::{Deserialize, Serialize};

use crate::font::{draw_text, measure_text, BitmapFont};
use crate::geometry::{Point, Rect};
use crate::settings::TextOverlaySection;
use crate::surface::{Canvas, Color, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayStyle {
    /// Always fully opaque.
    Static,
    /// Fades out after each reset.
    #[default]
    #[serde(rename = "simple", alias = "fade")]
    Fade,
    /// Drifts sideways and back.
    Shift,
}

pub trait Overlay {
    /// Advances the animation by one frame.
    fn compute(&mut self);

    /// Draws the current state onto `canvas`. Returns the written rect, or
    /// `None` when nothing is visible.
    fn render(&self, canvas: &mut dyn Canvas) -> Option<Rect>;

    /// Every pixel `render` may write in any state since the last reset.
    fn bounds(&self) -> Rect;

    fn reset(&mut self);

    /// Replaces the text and restarts the animation.
    fn set_text(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayOptions {
    pub style: OverlayStyle,
    pub color: Color,
    pub text_height: u32,
    pub frame_rate: u32,
    /// Seconds until a fading overlay is gone.
    pub fade_time: u32,
    /// Seconds for a shifting overlay to cross its span once.
    pub transition_time: u32,
}

impl OverlayOptions {
    /// Options for a clock `side` pixels wide; the text size in `section` is
    /// a percentage of it.
    pub fn from_settings(section: &TextOverlaySection, frame_rate: u32, side: u32) -> Self {
        let [r, g, b] = section.color;
        Self {
            style: section.style,
            color: Color::rgb(r, g, b),
            text_height: side * section.size / 100,
            frame_rate,
            fade_time: section.fade_time,
            transition_time: section.transition_time,
        }
    }
}

/// Creates the overlay `options.style` names, centered on `center`.
pub fn build(options: &OverlayOptions, center: Point, text: &str) -> Box<dyn Overlay> {
    let label = Label::new(BitmapFont::with_height(options.text_height), options.color, center, text);
    match options.style {
        OverlayStyle::Static => Box::new(StaticText::new(label)),
        OverlayStyle::Fade => Box::new(FadeText::new(
            label,
            options.frame_rate.saturating_mul(options.fade_time),
        )),
        OverlayStyle::Shift => Box::new(ShiftText::new(
            label,
            options.frame_rate.saturating_mul(options.transition_time),
        )),
    }
}

/// Text rasterized once per change.
#[derive(Debug, Clone)]
pub struct Label {
    font: BitmapFont,
    color: Color,
    center: Point,
    image: Surface,
}

impl Label {
    pub fn new(font: BitmapFont, color: Color, center: Point, text: &str) -> Self {
        let mut label = Self {
            font,
            color,
            center,
            image: Surface::new(0, 0),
        };
        label.set_text(text);
        label
    }

    pub fn set_text(&mut self, text: &str) {
        let (w, h) = measure_text(&self.font, text);
        let mut image = Surface::new(w, h);
        draw_text(&mut image, &self.font, text, Point::new(0, 0), self.color);
        self.image = image;
    }

    /// Where the text sits when not shifted.
    pub fn rect(&self) -> Rect {
        self.image.bounds().with_center(self.center)
    }

    fn draw(&self, canvas: &mut dyn Canvas, dx: i32, opacity: u8) -> Option<Rect> {
        if opacity == 0 {
            return None;
        }
        let at = self.rect().translate(dx, 0).origin();
        let written = canvas.blit_with_opacity(&self.image, at, self.image.bounds(), opacity);
        (!written.is_empty()).then_some(written)
    }
}

#[derive(Debug, Clone)]
pub struct StaticText {
    label: Label,
}

impl StaticText {
    pub fn new(label: Label) -> Self {
        Self { label }
    }
}

impl Overlay for StaticText {
    fn compute(&mut self) {}

    fn render(&self, canvas: &mut dyn Canvas) -> Option<Rect> {
        self.label.draw(canvas, 0, 0xFF)
    }

    fn bounds(&self) -> Rect {
        self.label.rect()
    }

    fn reset(&mut self) {}

    fn set_text(&mut self, text: &str) {
        self.label.set_text(text);
    }
}

/// Opacity falls linearly from 255 to 0 over `frames` computes.
#[derive(Debug, Clone)]
pub struct FadeText {
    label: Label,
    frames: u32,
    remaining: u32,
    alpha: u8,
}

impl FadeText {
    pub fn new(label: Label, frames: u32) -> Self {
        let frames = frames.max(1);
        Self {
            label,
            frames,
            remaining: frames,
            alpha: 0xFF,
        }
    }
}

impl Overlay for FadeText {
    fn compute(&mut self) {
        self.alpha = (u64::from(self.remaining) * 255 / u64::from(self.frames)) as u8;
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn render(&self, canvas: &mut dyn Canvas) -> Option<Rect> {
        self.label.draw(canvas, 0, self.alpha)
    }

    fn bounds(&self) -> Rect {
        self.label.rect()
    }

    fn reset(&mut self) {
        self.remaining = self.frames;
        self.alpha = 0xFF;
    }

    fn set_text(&mut self, text: &str) {
        self.label.set_text(text);
        self.reset();
    }
}

/// Moves right one pixel at a time across a quarter of the text width,
/// then back.
#[derive(Debug, Clone)]
pub struct ShiftText {
    label: Label,
    transition_frames: u32,
    span: i32,
    step: u32,
    countdown: u32,
    offset: i32,
    direction: i32,
}

impl ShiftText {
    pub fn new(label: Label, transition_frames: u32) -> Self {
        let mut shift = Self {
            label,
            transition_frames,
            span: 1,
            step: 1,
            countdown: 1,
            offset: 0,
            direction: 1,
        };
        shift.reset();
        shift
    }
}

impl Overlay for ShiftText {
    fn compute(&mut self) {
        self.countdown -= 1;
        if self.countdown > 0 {
            return;
        }
        self.countdown = self.step;
        self.offset += self.direction;
        if self.offset <= 0 || self.offset >= self.span {
            self.direction = -self.direction;
        }
    }

    fn render(&self, canvas: &mut dyn Canvas) -> Option<Rect> {
        self.label.draw(canvas, self.offset, 0xFF)
    }

    fn bounds(&self) -> Rect {
        let rect = self.label.rect();
        Rect::new(rect.x, rect.y, rect.w + self.span, rect.h)
    }

    fn reset(&mut self) {
        self.span = (self.label.rect().w / 4).max(1);
        self.step = (self.transition_frames / self.span as u32).max(1);
        self.countdown = self.step;
        self.offset = 0;
        self.direction = 1;
    }

    fn set_text(&mut self, text: &str) {
        self.label.set_text(text);
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Label {
        Label::new(BitmapFont::new(2), Color::WHITE, Point::new(50, 50), text)
    }

    #[test]
    fn label_is_centered() {
        let l = label("12.34");
        let rect = l.rect();
        assert_eq!((rect.w, rect.h), (48, 10));
        assert_eq!(rect.center(), Point::new(50, 50));
    }

    #[test]
    fn fade_alpha_falls_to_zero() {
        let mut fade = FadeText::new(label("1"), 10);
        let alphas: Vec<u8> = (0..12)
            .map(|_| {
                fade.compute();
                fade.alpha
            })
            .collect();
        assert_eq!(alphas[0], 255);
        assert_eq!(alphas[1], 229);
        assert_eq!(alphas[9], 25);
        assert_eq!(&alphas[10..], &[0, 0]);
        assert!(alphas.windows(2).all(|w| w[0] >= w[1]));

        let mut canvas = Surface::new(100, 100);
        assert_eq!(fade.render(&mut canvas), None);
        assert_eq!(canvas, Surface::new(100, 100));

        fade.set_text("2");
        fade.compute();
        assert_eq!(fade.alpha, 255);
        assert!(fade.render(&mut canvas).is_some());
    }

    #[test]
    fn long_fades_do_not_overflow() {
        let mut fade = FadeText::new(label("1"), u32::MAX);
        fade.compute();
        assert_eq!(fade.alpha, 255);
        fade.compute();
        assert_eq!(fade.alpha, 254);

        let options = OverlayOptions {
            fade_time: 700_000,
            transition_time: 700_000,
            frame_rate: 30_000,
            ..OverlayOptions::from_settings(&TextOverlaySection::default(), 30, 500)
        };
        let mut fade = build(&options, Point::new(250, 250), "12.00");
        fade.compute();
        assert!(fade.render(&mut Surface::new(500, 500)).is_some());
        let shift = build(
            &OverlayOptions {
                style: OverlayStyle::Shift,
                ..options
            },
            Point::new(250, 250),
            "12.00",
        );
        assert!(!shift.bounds().is_empty());
    }

    #[test]
    fn static_text_draws_inside_bounds() {
        let text = StaticText::new(label("09.41"));
        let mut canvas = Surface::new(100, 100);
        let written = text.render(&mut canvas).unwrap();
        assert_eq!(written, text.bounds());
        assert!(text.bounds().contains(&canvas.bounding_rect()));
    }

    #[test]
    fn shift_bounces_within_bounds() {
        let mut shift = ShiftText::new(label("88.88"), 0);
        let span = shift.bounds().w - shift.label.rect().w;
        assert_eq!(span, 12);
        let mut offsets = Vec::new();
        for _ in 0..40 {
            shift.compute();
            offsets.push(shift.offset);
            let mut canvas = Surface::new(100, 100);
            shift.render(&mut canvas);
            assert!(shift.bounds().contains(&canvas.bounding_rect()));
        }
        assert_eq!(offsets.iter().max(), Some(&span));
        assert_eq!(offsets.iter().min(), Some(&0));
        assert!(offsets.windows(2).all(|w| (w[0] - w[1]).abs() == 1));
    }

    #[test]
    fn shift_waits_between_steps() {
        // 12px span over 24 frames moves every other frame
        let mut shift = ShiftText::new(label("88.88"), 24);
        let offsets: Vec<i32> = (0..4)
            .map(|_| {
                shift.compute();
                shift.offset
            })
            .collect();
        assert_eq!(offsets, vec![0, 1, 1, 2]);
    }

    #[test]
    fn build_picks_the_style() {
        let mut options = OverlayOptions::from_settings(&TextOverlaySection::default(), 30, 500);
        assert_eq!(options.text_height, 50);
        assert_eq!(options.color, Color::rgb(128, 0, 0));
        options.style = OverlayStyle::Shift;
        let overlay = build(&options, Point::new(250, 250), "12.00");
        let plain = Label::new(BitmapFont::with_height(50), options.color, Point::new(250, 250), "12.00");
        assert!(overlay.bounds().w > plain.rect().w);
    }
}
