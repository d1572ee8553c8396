use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned pixel rectangle, `x`/`y` at the top-left corner.
///
/// Rects with a non-positive width or height are empty. Empty rects are the
/// identity for [`Rect::union`], so "no previous position" can be stored as
/// [`Rect::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// The tight rect covering every point, inclusive of the last pixel.
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, 1 + max_x - min_x, 1 + max_y - min_y)
    }

    /// The square of side `2 * half + 1` centered on `center`.
    pub fn around(center: Point, half: i32) -> Self {
        Self::new(center.x - half, center.y - half, 2 * half + 1, 2 * half + 1)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// The overlapping part of two rects, or an empty rect at `self`'s origin.
    pub fn intersection(&self, other: &Self) -> Self {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Self::new(self.x, self.y, 0, 0);
        }
        Self::new(x, y, right - x, bottom - y)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn inflate(&self, dw: i32, dh: i32) -> Self {
        Self::new(self.x - dw / 2, self.y - dh / 2, self.w + dw, self.h + dh)
    }

    pub fn with_center(&self, center: Point) -> Self {
        Self::new(center.x - self.w / 2, center.y - self.h / 2, self.w, self.h)
    }

    pub fn re_reference(&self, outer: &Self) -> Self {
        self.translate(outer.x, outer.y)
    }
}

/// Projects a point at `angle` radians and `radius` pixels from `center`,
/// truncated toward zero.
pub fn point_on_circle(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(
        (f64::from(center.x) + radius * angle.cos()) as i32,
        (f64::from(center.y) + radius * angle.sin()) as i32,
    )
}

/// The dial angle of `unit` out of `total`, zero at 12 o'clock and growing
/// clockwise, expressed in screen radians (x right, y down).
pub fn angle_for_unit(unit: f64, total: f64) -> f64 {
    2.0 * PI * unit / total - PI / 2.0
}

pub fn center_square(width: u32, height: u32) -> Rect {
    let (w, h) = (width as i32, height as i32);
    if h <= w {
        Rect::new((w - h) / 2, 0, h, h)
    } else {
        Rect::new(0, (h - w) / 2, w, w)
    }
}
