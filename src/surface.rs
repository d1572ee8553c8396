use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(1, 1, 1);
    pub const WHITE: Self = Self::rgb(240, 240, 240);
    pub const RED: Self = Self::rgb(250, 0, 0);
    pub const SOFT_RED: Self = Self::rgb(255, 102, 102);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_bytes(px: &[u8]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }
}

fn mul_255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

/// Source-over compositing of `src` onto the RGBA8 pixel `dst`.
fn blend_into(dst: &mut [u8], src: Color) {
    let sa = u32::from(src.a);
    if sa == 0 {
        return;
    }
    if sa == 0xFF {
        dst.copy_from_slice(&src.to_bytes());
        return;
    }
    let da = u32::from(dst[3]);
    let keep = mul_255(da, 255 - sa);
    let out_a = sa + keep;
    for (channel, s) in dst[..3].iter_mut().zip([src.r, src.g, src.b]) {
        let c = u32::from(s) * sa + u32::from(*channel) * keep;
        *channel = ((c + out_a / 2) / out_a) as u8;
    }
    dst[3] = out_a as u8;
}

/// Anything that exposes a row-major RGBA8 pixel buffer.
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    #[cfg(test)]
    fn data(&self) -> &[u8];
    fn data_mut(&mut self) -> &mut [u8];

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    #[cfg(test)]
    fn pixel(&self, x: i32, y: i32) -> Color {
        let i = (y as usize * self.width() as usize + x as usize) * 4;
        Color::from_bytes(&self.data()[i..i + 4])
    }

    /// Replaces every pixel in `rect` (clipped to the canvas) with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = rect.intersection(&self.bounds());
        if rect.is_empty() {
            return;
        }
        let width = self.width() as usize;
        let bytes = color.to_bytes();
        let data = self.data_mut();
        for y in rect.y..rect.bottom() {
            let start = (y as usize * width + rect.x as usize) * 4;
            let end = start + rect.w as usize * 4;
            for px in data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&bytes);
            }
        }
    }

    fn fill(&mut self, color: Color) {
        self.fill_rect(self.bounds(), color);
    }

    /// Blends `color` at `(x, y)` scaled by `coverage` in `[0, 1]`.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if !self.bounds().contains_point(Point::new(x, y)) || coverage <= 0.0 {
            return;
        }
        let alpha = (f32::from(color.a) * coverage.min(1.0)).round() as u8;
        let i = (y as usize * self.width() as usize + x as usize) * 4;
        blend_into(&mut self.data_mut()[i..i + 4], color.with_alpha(alpha));
    }

    /// Scales the alpha at `(x, y)` down by `coverage`, punching a hole.
    fn erase_pixel(&mut self, x: i32, y: i32, coverage: f32) {
        if !self.bounds().contains_point(Point::new(x, y)) || coverage <= 0.0 {
            return;
        }
        let i = (y as usize * self.width() as usize + x as usize) * 4;
        let data = self.data_mut();
        let keep = 1.0 - coverage.min(1.0);
        data[i + 3] = (f32::from(data[i + 3]) * keep).round() as u8;
    }

    /// Composites `area` of `src` with its top-left at `dest`.
    ///
    /// `area` is clipped to `src` and the destination to this canvas; the
    /// returned rect is the part of the canvas actually touched (empty at
    /// `dest` when nothing was drawn).
    fn blit(&mut self, src: &Surface, dest: Point, area: Rect) -> Rect {
        self.blit_with_opacity(src, dest, area, 0xFF)
    }

    fn blit_with_opacity(&mut self, src: &Surface, dest: Point, area: Rect, opacity: u8) -> Rect {
        let area_clipped = area.intersection(&src.bounds());
        let placed = Rect::new(
            dest.x + (area_clipped.x - area.x),
            dest.y + (area_clipped.y - area.y),
            area_clipped.w,
            area_clipped.h,
        );
        let target = placed.intersection(&self.bounds());
        if area_clipped.is_empty() || target.is_empty() {
            return Rect::new(dest.x, dest.y, 0, 0);
        }
        let src_x = area_clipped.x + (target.x - placed.x);
        let src_y = area_clipped.y + (target.y - placed.y);
        let width = self.width() as usize;
        let data = self.data_mut();
        for row in 0..target.h {
            let s = ((src_y + row) as usize * src.width as usize + src_x as usize) * 4;
            let d = ((target.y + row) as usize * width + target.x as usize) * 4;
            let n = target.w as usize * 4;
            let src_row = &src.pixels[s..s + n];
            let dst_row = &mut data[d..d + n];
            for (dst_px, src_px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let mut color = Color::from_bytes(src_px);
                if opacity != 0xFF {
                    color.a = mul_255(u32::from(color.a), u32::from(opacity)) as u8;
                }
                blend_into(dst_px, color);
            }
        }
        target
    }
}

/// An owned RGBA8 image with per-pixel alpha.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut surface = Self::new(width, height);
        surface.fill(color);
        surface
    }

    /// Wraps a decoded row-major RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize * 4, "pixel buffer size");
        Self { width, height, pixels }
    }

    /// The smallest rect inside `within` holding every non-transparent pixel.
    pub fn bounding_rect_within(&self, within: Rect) -> Rect {
        let within = within.intersection(&self.bounds());
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for y in within.y..within.bottom() {
            let row = (y as usize * self.width as usize) * 4;
            for x in within.x..within.right() {
                if self.pixels[row + x as usize * 4 + 3] != 0 {
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x > max_x {
            return Rect::default();
        }
        Rect::new(min_x, min_y, 1 + max_x - min_x, 1 + max_y - min_y)
    }

    #[cfg(test)]
    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect_within(self.bounds())
    }

    pub fn crop(&self, rect: Rect) -> Self {
        let mut out = Self::new(rect.w.max(0) as u32, rect.h.max(0) as u32);
        let rect = rect.intersection(&self.bounds());
        for row in 0..rect.h {
            let s = ((rect.y + row) as usize * self.width as usize + rect.x as usize) * 4;
            let d = row as usize * out.width as usize * 4;
            let n = rect.w as usize * 4;
            out.pixels[d..d + n].copy_from_slice(&self.pixels[s..s + n]);
        }
        out
    }
}

impl Canvas for Surface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    fn data(&self) -> &[u8] {
        &self.pixels
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

/// A borrowed framebuffer, e.g. the one handed out by `pixels`.
pub struct Frame<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            data,
            width,
            height,
        }
    }
}

impl Canvas for Frame<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    fn data(&self) -> &[u8] {
        &*self.data
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_blit_copies() {
        let src = Surface::filled(4, 4, Color::RED);
        let mut dst = Surface::filled(10, 10, Color::WHITE);
        let touched = dst.blit(&src, Point::new(2, 3), Rect::new(0, 0, 4, 4));
        assert_eq!(touched, Rect::new(2, 3, 4, 4));
        assert_eq!(dst.pixel(2, 3), Color::RED);
        assert_eq!(dst.pixel(5, 6), Color::RED);
        assert_eq!(dst.pixel(6, 6), Color::WHITE);
    }

    #[test]
    fn blit_clips_to_target_and_source() {
        let src = Surface::filled(4, 4, Color::RED);
        let mut dst = Surface::filled(5, 5, Color::WHITE);
        let touched = dst.blit(&src, Point::new(3, 3), Rect::new(0, 0, 8, 8));
        assert_eq!(touched, Rect::new(3, 3, 2, 2));
        let touched = dst.blit(&src, Point::new(20, 20), Rect::new(0, 0, 4, 4));
        assert!(touched.is_empty());
    }

    #[test]
    fn transparent_pixels_leave_destination() {
        let src = Surface::new(3, 3);
        let mut dst = Surface::filled(3, 3, Color::BLACK);
        dst.blit(&src, Point::new(0, 0), src.bounds());
        assert_eq!(dst, Surface::filled(3, 3, Color::BLACK));
    }

    #[test]
    fn half_alpha_blends() {
        let mut dst = Surface::filled(1, 1, Color::rgb(0, 0, 0));
        dst.blend_pixel(0, 0, Color::rgb(200, 100, 0), 0.5);
        let px = dst.pixel(0, 0);
        assert_eq!(px.a, 0xFF);
        assert!((99..=101).contains(&px.r));
        assert!((49..=51).contains(&px.g));
    }

    #[test]
    fn bounding_rect_and_crop() {
        let mut s = Surface::new(20, 20);
        s.fill_rect(Rect::new(5, 6, 3, 4), Color::RED);
        let r = s.bounding_rect();
        assert_eq!(r, Rect::new(5, 6, 3, 4));
        let c = s.crop(r);
        assert_eq!((c.width(), c.height()), (3, 4));
        assert_eq!(c.bounding_rect(), Rect::new(0, 0, 3, 4));
        assert_eq!(Surface::new(4, 4).bounding_rect(), Rect::default());
    }

    #[test]
    fn frame_shares_canvas_behavior() {
        let mut buf = vec![0u8; 4 * 4 * 4];
        let mut frame = Frame::new(&mut buf, 4, 4);
        frame.fill_rect(Rect::new(1, 1, 2, 2), Color::WHITE);
        assert_eq!(frame.pixel(1, 1), Color::WHITE);
        assert_eq!(frame.pixel(0, 0), Color::TRANSPARENT);
    }
}
