//! Antialiased raster primitives.
//!
//! Vertices are integer pixel positions and are treated as pixel centers, so
//! a shape never touches pixels outside [`Rect::bounding`] of its vertices.
//! Every function returns the rect it may have touched.

use std::f64::consts::FRAC_PI_2;

use crate::geometry::{point_on_circle, Point, Rect};
use crate::surface::{Canvas, Color};

/// Horizontal sub-scanlines sampled per pixel row.
const SUBSAMPLES: usize = 4;

/// Base/tip width difference of a tapered hand, in pixels.
pub const TAPER_SKEW: f64 = 2.0;

/// Fills a simple polygon using even-odd scanline coverage.
pub fn fill_polygon(canvas: &mut dyn Canvas, points: &[Point], color: Color) -> Rect {
    let bounds = Rect::bounding(points);
    let clip = bounds.intersection(&canvas.bounds());
    if points.len() < 3 || clip.is_empty() {
        return bounds;
    }
    let verts: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (f64::from(p.x) + 0.5, f64::from(p.y) + 0.5))
        .collect();
    let mut coverage = vec![0.0f32; clip.w as usize];
    let mut crossings = Vec::with_capacity(verts.len());
    for py in clip.y..clip.bottom() {
        coverage.iter_mut().for_each(|c| *c = 0.0);
        for s in 0..SUBSAMPLES {
            let sy = f64::from(py) + (s as f64 + 0.5) / SUBSAMPLES as f64;
            crossings.clear();
            for (i, &(ax, ay)) in verts.iter().enumerate() {
                let (bx, by) = verts[(i + 1) % verts.len()];
                if (ay <= sy && sy < by) || (by <= sy && sy < ay) {
                    crossings.push(ax + (sy - ay) * (bx - ax) / (by - ay));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                accumulate_span(&mut coverage, clip.x, span[0], span[1]);
            }
        }
        for (i, c) in coverage.iter().enumerate() {
            canvas.blend_pixel(clip.x + i as i32, py, color, *c);
        }
    }
    bounds
}

fn accumulate_span(coverage: &mut [f32], x0: i32, left: f64, right: f64) {
    let first = (left.floor() as i32).max(x0);
    let last = (right.ceil() as i32).min(x0 + coverage.len() as i32);
    for px in first..last {
        let overlap = right.min(f64::from(px + 1)) - left.max(f64::from(px));
        if overlap > 0.0 {
            coverage[(px - x0) as usize] += (overlap / SUBSAMPLES as f64) as f32;
        }
    }
}

fn circle_coverage(distance: f64, radius: f64) -> f32 {
    (radius + 0.5 - distance).clamp(0.0, 1.0) as f32
}

fn for_each_in_circle(canvas_bounds: Rect, center: Point, radius: i32, mut f: impl FnMut(i32, i32, f64)) {
    let rect = Rect::around(center, radius).intersection(&canvas_bounds);
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let (dx, dy) = (f64::from(x - center.x), f64::from(y - center.y));
            f(x, y, (dx * dx + dy * dy).sqrt());
        }
    }
}

pub fn fill_circle(canvas: &mut dyn Canvas, center: Point, radius: i32, color: Color) -> Rect {
    let r = f64::from(radius);
    for_each_in_circle(canvas.bounds(), center, radius, |x, y, d| {
        canvas.blend_pixel(x, y, color, circle_coverage(d, r));
    });
    Rect::around(center, radius)
}

/// Erases a disc to transparency.
pub fn clear_circle(canvas: &mut dyn Canvas, center: Point, radius: i32) -> Rect {
    let r = f64::from(radius);
    for_each_in_circle(canvas.bounds(), center, radius, |x, y, d| {
        canvas.erase_pixel(x, y, circle_coverage(d, r));
    });
    Rect::around(center, radius)
}

/// A filled annulus between `inner` and `outer` radius.
pub fn fill_ring(canvas: &mut dyn Canvas, center: Point, outer: i32, inner: i32, color: Color) -> Rect {
    let (ro, ri) = (f64::from(outer), f64::from(inner));
    for_each_in_circle(canvas.bounds(), center, outer, |x, y, d| {
        let cov = circle_coverage(d, ro) * (1.0 - circle_coverage(d, ri));
        canvas.blend_pixel(x, y, color, cov);
    });
    Rect::around(center, outer)
}

/// The four corners of a radial bar from `center` out to `radius`.
///
/// The tip is `width - skew` wide and the base `width + skew` wide.
pub fn radial_quad(center: Point, radius: f64, angle: f64, width: f64, skew: f64) -> [Point; 4] {
    let tip = point_on_circle(center, radius, angle);
    let tip_half = (width - skew) / 2.0;
    let base_half = (width + skew) / 2.0;
    [
        point_on_circle(tip, tip_half, angle - FRAC_PI_2),
        point_on_circle(tip, tip_half, angle + FRAC_PI_2),
        point_on_circle(center, base_half, angle + FRAC_PI_2),
        point_on_circle(center, base_half, angle - FRAC_PI_2),
    ]
}

/// Draws a square-ended bar of `width` from `center` towards `angle`.
pub fn draw_radial_line(
    canvas: &mut dyn Canvas,
    center: Point,
    radius: f64,
    angle: f64,
    color: Color,
    width: f64,
) -> Rect {
    fill_polygon(canvas, &radial_quad(center, radius, angle, width, 0.0), color)
}

/// Draws a clock hand slightly wider at the hub than at the tip.
///
/// The returned rect is the tight bounding box of the hand's corners and is
/// identical for identical inputs, which the frame cache and the dirty
/// tracker rely on.
pub fn draw_tapered_radial_line(
    canvas: &mut dyn Canvas,
    center: Point,
    radius: f64,
    angle: f64,
    color: Color,
    width: f64,
) -> Rect {
    fill_polygon(canvas, &radial_quad(center, radius, angle, width, TAPER_SKEW), color)
}

/// A rectangle with rounded corners of `bevel` radius; `rect` is in canvas
/// coordinates.
pub fn fill_beveled_rect(canvas: &mut dyn Canvas, rect: Rect, bevel: i32, color: Color) -> Rect {
    let horizontal = Rect::new(rect.x + bevel, rect.y, rect.w - 2 * bevel, rect.h);
    let vertical = Rect::new(rect.x, rect.y + bevel, rect.w, rect.h - 2 * bevel);
    for bar in [horizontal, vertical] {
        let clipped = bar.intersection(&canvas.bounds());
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                canvas.blend_pixel(x, y, color, 1.0);
            }
        }
    }
    let (right, bottom) = (rect.right() - 1 - bevel, rect.bottom() - 1 - bevel);
    let corners = [
        Point::new(rect.x + bevel, rect.y + bevel),
        Point::new(right, rect.y + bevel),
        Point::new(rect.x + bevel, bottom),
        Point::new(right, bottom),
    ];
    for corner in corners {
        fill_circle(canvas, corner, bevel, color);
    }
    rect
}
