use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::draw::{clear_circle, draw_radial_line, draw_tapered_radial_line, fill_beveled_rect, fill_circle, fill_ring};
use crate::font::{draw_text, measure_text, GlyphSource};
use crate::geometry::{angle_for_unit, point_on_circle, Point, Rect};
use crate::ramp::RampCurve;
use crate::surface::{Canvas, Color, Surface};

/// Dial proportions, all derived from the face radius.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockGeometry {
    pub side: i32,
    pub margin: i32,
    pub radius: i32,
    pub hour_len: f64,
    pub minute_len: f64,
    pub second_len: f64,
    pub tick_stroke: f64,
    pub hour_tick_stroke: f64,
    pub tick_len: f64,
    pub hour_tick_len: f64,
    pub quarter_tick_len: f64,
    pub tick_margin: f64,
    pub date_distance: f64,
    pub hour_stroke: f64,
    pub minute_stroke: f64,
    pub second_stroke: f64,
    pub second_circle_radius: i32,
    pub second_circle_distance: f64,
    pub hub_radius: i32,
}

impl ClockGeometry {
    /// Proportions for a square of `side` pixels with `margin` pixels of
    /// total border. The caller guarantees `margin < side`.
    pub fn new(side: u32, margin: u32) -> Self {
        let side = side as i32;
        let margin = margin as i32;
        let r = (side - margin) / 2;
        let tick_stroke = f64::from(r / 45);
        let tick_len = f64::from(r * 2 / 35);
        let hour_tick_len = tick_len * 3.0;
        let minute_stroke = r * 2 / 35;
        let second_len = (f64::from(r) * 9.5 / 10.0).floor();
        Self {
            side,
            margin,
            radius: r,
            hour_len: f64::from(r * 5 / 8),
            minute_len: f64::from(r * 9 / 10),
            second_len,
            tick_stroke,
            hour_tick_stroke: tick_stroke * 2.5,
            tick_len,
            hour_tick_len,
            quarter_tick_len: (hour_tick_len * 1.4).trunc(),
            tick_margin: f64::from(r / 64),
            date_distance: f64::from(r * 9 / 16),
            hour_stroke: f64::from(r / 14),
            minute_stroke: f64::from(minute_stroke),
            second_stroke: f64::from(r / 55),
            second_circle_radius: r / 10,
            second_circle_distance: (2.0 * second_len / 3.0).floor(),
            hub_radius: minute_stroke + 4,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.side / 2, self.side / 2)
    }

    pub fn face_radius(&self) -> i32 {
        self.side / 2 - self.margin / 2
    }
}

/// Paints the static dial: black surround, white face, hour and minute ticks.
pub fn render_face(background: &mut Surface, geometry: &ClockGeometry) {
    let center = geometry.center();
    background.fill(Color::BLACK);
    fill_circle(background, center, geometry.face_radius(), Color::WHITE);
    let r = f64::from(geometry.radius);
    for hour in 0..12 {
        let angle = angle_for_unit(f64::from(hour), 12.0);
        let len = if hour % 3 == 0 {
            geometry.quarter_tick_len
        } else {
            geometry.hour_tick_len
        };
        let start = point_on_circle(center, r - len - geometry.tick_margin, angle);
        draw_radial_line(background, start, len, angle, Color::BLACK, geometry.hour_tick_stroke);
    }
    for minute in 0..60 {
        let angle = angle_for_unit(f64::from(minute), 60.0);
        let start = point_on_circle(center, r - geometry.tick_len - geometry.tick_margin, angle);
        draw_radial_line(background, start, geometry.tick_len, angle, Color::BLACK, geometry.tick_stroke);
    }
}

/// The red box near 12 o'clock that shows `MM.DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBox {
    pub rect: Rect,
    text_offset: i32,
}

impl DateBox {
    /// Sizes the box for the widest date the font can produce.
    pub fn layout(geometry: &ClockGeometry, font: &dyn GlyphSource) -> Self {
        let (w, h) = measure_text(font, "88.88");
        let (w, h) = (w as i32, h as i32);
        let anchor = point_on_circle(geometry.center(), geometry.date_distance, -std::f64::consts::FRAC_PI_2);
        let rect = Rect::new(0, 0, w, h).with_center(anchor).inflate(w / 20, 11 * h / 16);
        Self {
            rect,
            text_offset: geometry.radius / 66,
        }
    }

    pub fn draw(&self, background: &mut Surface, font: &dyn GlyphSource, date: NaiveDate) {
        background.fill_rect(self.rect, Color::WHITE);
        fill_beveled_rect(background, self.rect, self.rect.h / 3, Color::SOFT_RED);
        let text = format!("{:02}.{:02}", date.month(), date.day());
        let (w, h) = measure_text(font, &text);
        let mut at = Rect::new(0, 0, w as i32, h as i32).with_center(self.rect.center());
        at.y += self.text_offset;
        draw_text(background, font, &text, at.origin(), Color::WHITE);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub second: u32,
    pub sub_frame: u32,
}

impl FrameKey {
    pub const fn new(second: u32, sub_frame: u32) -> Self {
        Self { second, sub_frame }
    }
}

#[derive(Debug, Clone)]
pub struct CachedFrame {
    pub image: Surface,
    pub rect: Rect,
}

/// Every second-hand frame for one minute, built once.
#[derive(Debug)]
pub struct FrameCache {
    frame_rate: u32,
    frames: Vec<CachedFrame>,
}

impl FrameCache {
    pub fn build(geometry: &ClockGeometry, frame_rate: u32, curve: RampCurve) -> Self {
        let started = Instant::now();
        let ramp = curve.ramp(frame_rate);
        let side = geometry.side as u32;
        let mut scratch = Surface::new(side, side);
        let mut frames = Vec::with_capacity(60 * frame_rate as usize);
        for second in 0..60 {
            for progress in &ramp {
                let touched = draw_second_hand(&mut scratch, geometry, f64::from(second) + progress);
                let rect = scratch.bounding_rect_within(touched);
                frames.push(CachedFrame {
                    image: scratch.crop(rect),
                    rect,
                });
                scratch.fill_rect(touched, Color::TRANSPARENT);
            }
        }
        let cache = Self { frame_rate, frames };
        debug!(
            "rendered {} second-hand frames in {:?}",
            cache.len(),
            started.elapsed()
        );
        cache
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Looks up a frame. Keys outside `[0, 59] × [0, frame_rate)` are a
    /// logic error and panic.
    pub fn get(&self, key: FrameKey) -> &CachedFrame {
        assert!(
            key.second < 60 && key.sub_frame < self.frame_rate,
            "frame key {key:?} outside cache of {} frames per second",
            self.frame_rate
        );
        &self.frames[(key.second * self.frame_rate + key.sub_frame) as usize]
    }
}

/// Draws the red hand, its ring and the hub at `seconds` (fractional) onto a
/// transparent canvas. Returns the area that may have been touched.
fn draw_second_hand(canvas: &mut Surface, geometry: &ClockGeometry, seconds: f64) -> Rect {
    let center = geometry.center();
    let angle = angle_for_unit(seconds, 60.0);
    let mut touched = draw_tapered_radial_line(
        canvas,
        center,
        geometry.second_len,
        angle,
        Color::RED,
        geometry.second_stroke,
    );
    let ring_center = point_on_circle(center, geometry.second_circle_distance, angle);
    let outer = geometry.second_circle_radius;
    let inner = outer - (geometry.second_stroke as i32 * 10 / 8);
    clear_circle(canvas, ring_center, inner);
    touched = touched.union(&fill_ring(canvas, ring_center, outer, inner, Color::RED));
    touched.union(&fill_circle(canvas, center, geometry.hub_radius, Color::BLACK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BitmapFont;

    #[test]
    fn proportions_follow_radius() {
        let g = ClockGeometry::new(700, 150);
        assert_eq!(g.radius, 275);
        assert_eq!(g.hour_len, 171.0);
        assert_eq!(g.minute_len, 247.0);
        assert_eq!(g.second_len, 261.0);
        assert_eq!(g.second_circle_distance, 174.0);
        assert_eq!(g.hub_radius, 19);
        assert_eq!(g.center(), Point::new(350, 350));
        assert_eq!(g.face_radius(), 275);
    }

    #[test]
    fn cache_is_complete() {
        let g = ClockGeometry::new(120, 20);
        let fps = 3;
        let cache = FrameCache::build(&g, fps, RampCurve::ClockworkLong);
        assert_eq!(cache.len(), 60 * fps as usize);
        for second in 0..60 {
            for sub_frame in 0..fps {
                let frame = cache.get(FrameKey::new(second, sub_frame));
                assert!(!frame.rect.is_empty());
                assert_eq!(frame.image.width() as i32, frame.rect.w);
                assert_eq!(frame.image.height() as i32, frame.rect.h);
                assert!(frame.rect.contains_point(g.center()), "hub missing at {second}.{sub_frame}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "outside cache")]
    fn out_of_range_lookup_panics() {
        let g = ClockGeometry::new(60, 10);
        let cache = FrameCache::build(&g, 2, RampCurve::Sinusoid);
        cache.get(FrameKey::new(0, 2));
    }

    #[test]
    fn frames_are_trimmed_to_content() {
        let g = ClockGeometry::new(200, 20);
        let cache = FrameCache::build(&g, 1, RampCurve::ContinuousSweep);
        let frame = cache.get(FrameKey::new(15, 0));
        assert_eq!(frame.image.bounding_rect(), Rect::new(0, 0, frame.rect.w, frame.rect.h));
        // at 15 seconds the hand points right of the hub
        assert!(frame.rect.right() > g.center().x + g.second_len as i32 - 2);
    }

    #[test]
    fn date_box_sits_above_center() {
        let g = ClockGeometry::new(400, 50);
        let font = BitmapFont::with_height((3 * g.radius / 25) as u32);
        let date_box = DateBox::layout(&g, &font);
        assert!(date_box.rect.bottom() < g.center().y);
        let mut bg = Surface::new(400, 400);
        render_face(&mut bg, &g);
        date_box.draw(&mut bg, &font, NaiveDate::from_ymd_opt(2021, 9, 13).unwrap());
        assert_eq!(bg.pixel(date_box.rect.x + date_box.rect.w / 2, date_box.rect.y + 2), Color::SOFT_RED);
    }
}
