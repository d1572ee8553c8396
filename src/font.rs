use std::path::Path;

use crate::error::AssetError;
use crate::geometry::{Point, Rect};
use crate::surface::{Canvas, Color};

/// A rasterized character as an 8-bit coverage mask.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub advance: u32,
    pub coverage: Vec<u8>,
}

/// A source of glyphs for date and time text.
pub trait GlyphSource {
    fn line_height(&self) -> u32;
    fn glyph(&self, ch: char) -> Option<Glyph>;
}

const GLYPH_W: u32 = 4;
const GLYPH_H: u32 = 5;

/// 4x5 hex sprites, one row per byte, high nibble used.
const SPRITES: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const DOT: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0x40];
const COLON: [u8; 5] = [0x00, 0x40, 0x00, 0x40, 0x00];
const BLANK: [u8; 5] = [0x00; 5];

/// Blocky hex-digit font scaled by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    pub fn new(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }

    /// The largest scale whose line height does not exceed `pixels`.
    pub fn with_height(pixels: u32) -> Self {
        Self::new(pixels / GLYPH_H)
    }

    fn rows(ch: char) -> Option<&'static [u8]> {
        match ch {
            '.' => Some(&DOT),
            ':' => Some(&COLON),
            ' ' => Some(&BLANK),
            _ => {
                let digit = ch.to_digit(16)? as usize;
                Some(&SPRITES[digit * 5..digit * 5 + 5])
            }
        }
    }
}

impl GlyphSource for BitmapFont {
    fn line_height(&self) -> u32 {
        GLYPH_H * self.scale
    }

    fn glyph(&self, ch: char) -> Option<Glyph> {
        let rows = Self::rows(ch.to_ascii_uppercase())?;
        let (width, height) = (GLYPH_W * self.scale, GLYPH_H * self.scale);
        let mut coverage = vec![0u8; (width * height) as usize];
        for (i, c) in coverage.iter_mut().enumerate() {
            let x = i as u32 % width / self.scale;
            let y = i as u32 / width / self.scale;
            if (rows[y as usize] >> (7 - x)) & 1 == 1 {
                *c = 0xFF;
            }
        }
        Some(Glyph {
            width,
            height,
            advance: width + self.scale,
            coverage,
        })
    }
}

/// Width and height of `text` laid out on one line.
pub fn measure_text(font: &dyn GlyphSource, text: &str) -> (u32, u32) {
    let mut width = 0;
    let mut last_gap = 0;
    for glyph in text.chars().filter_map(|ch| font.glyph(ch)) {
        width += glyph.advance;
        last_gap = glyph.advance - glyph.width;
    }
    (width - last_gap, font.line_height())
}

/// Draws `text` with its top-left at `origin`; missing glyphs are skipped
/// and glyph rows below the line height are cut off.
pub fn draw_text(canvas: &mut dyn Canvas, font: &dyn GlyphSource, text: &str, origin: Point, color: Color) -> Rect {
    let (w, h) = measure_text(font, text);
    let mut pen = origin.x;
    for glyph in text.chars().filter_map(|ch| font.glyph(ch)) {
        let rows = glyph.coverage.chunks_exact(glyph.width.max(1) as usize);
        for (dy, row) in rows.take(glyph.height.min(h) as usize).enumerate() {
            for (dx, &c) in row.iter().enumerate() {
                if c != 0 {
                    canvas.blend_pixel(pen + dx as i32, origin.y + dy as i32, color, f32::from(c) / 255.0);
                }
            }
        }
        pen += glyph.advance as i32;
    }
    Rect::new(origin.x, origin.y, w as i32, h as i32)
}

/// Characters of a glyph sheet, left to right.
pub const SHEET_CHARS: &str = "0123456789.: ";

/// Glyphs cut from a horizontal strip image with one equal-width cell per
/// character of [`SHEET_CHARS`]. Coverage is luminance times alpha, so both
/// light-on-transparent and light-on-black sheets work.
#[derive(Debug, Clone)]
pub struct SheetFont {
    cell_width: u32,
    height: u32,
    cells: Vec<Vec<u8>>,
}

impl SheetFont {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let sheet = image::open(path)
            .map_err(|e| AssetError::Decode {
                path: path.to_owned(),
                source: e,
            })?
            .into_luma_alpha8();
        let (width, height) = sheet.dimensions();
        let coverage: Vec<u8> = sheet
            .pixels()
            .map(|p| (u16::from(p.0[0]) * u16::from(p.0[1]) / 255) as u8)
            .collect();
        Self::from_coverage(width, height, &coverage).map_err(|reason| AssetError::BadSheet {
            path: path.to_owned(),
            reason,
        })
    }

    fn from_coverage(width: u32, height: u32, coverage: &[u8]) -> Result<Self, String> {
        let count = SHEET_CHARS.chars().count() as u32;
        if height == 0 || width < count || width % count != 0 {
            return Err(format!("a {width}x{height} sheet does not split into {count} cells"));
        }
        let cell_width = width / count;
        let cells = (0..count)
            .map(|cell| {
                (0..height)
                    .flat_map(|y| {
                        let start = (y * width + cell * cell_width) as usize;
                        coverage[start..start + cell_width as usize].iter().copied()
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            cell_width,
            height,
            cells,
        })
    }
}

impl GlyphSource for SheetFont {
    fn line_height(&self) -> u32 {
        self.height
    }

    fn glyph(&self, ch: char) -> Option<Glyph> {
        let index = SHEET_CHARS.chars().position(|c| c == ch)?;
        Some(Glyph {
            width: self.cell_width,
            height: self.height,
            advance: self.cell_width,
            coverage: self.cells[index].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    #[test]
    fn date_string_measures() {
        let font = BitmapFont::new(2);
        // four digits and a dot, each 10px wide with 2px spacing
        assert_eq!(measure_text(&font, "88.88"), (5 * 10 - 2, 10));
        assert_eq!(measure_text(&font, ""), (0, 10));
    }

    #[test]
    fn eight_is_a_box() {
        let font = BitmapFont::new(1);
        let g = font.glyph('8').unwrap();
        let row = |y: usize| &g.coverage[y * 4..y * 4 + 4];
        assert_eq!(row(0), &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(row(1), &[0xFF, 0, 0, 0xFF]);
    }

    #[test]
    fn unknown_glyphs_are_skipped() {
        let font = BitmapFont::new(1);
        assert!(font.glyph('?').is_none());
        assert_eq!(measure_text(&font, "1?2"), measure_text(&font, "12"));
    }

    #[test]
    fn draws_inside_reported_rect() {
        let mut s = Surface::new(60, 20);
        let font = BitmapFont::new(2);
        let rect = draw_text(&mut s, &font, "10.15", Point::new(3, 4), Color::WHITE);
        assert!(rect.contains(&s.bounding_rect()));
    }

    #[test]
    fn sheet_splits_into_cells() {
        let count = SHEET_CHARS.chars().count();
        // 2px cells, 3 rows; cell i is filled with value i
        let width = 2 * count as u32;
        let coverage: Vec<u8> = (0..3).flat_map(|_| (0..width).map(|x| (x / 2) as u8)).collect();
        let font = SheetFont::from_coverage(width, 3, &coverage).unwrap();
        assert_eq!(font.line_height(), 3);
        let seven = font.glyph('7').unwrap();
        assert_eq!((seven.width, seven.height, seven.advance), (2, 3, 2));
        assert!(seven.coverage.iter().all(|&c| c == 7));
        assert_eq!(font.glyph('.').unwrap().coverage[0], 10);
        assert!(font.glyph('x').is_none());
    }

    #[test]
    fn uneven_sheet_is_rejected() {
        let count = SHEET_CHARS.chars().count() as u32;
        assert!(SheetFont::from_coverage(count + 1, 2, &vec![0; 2 * (count as usize + 1)]).is_err());
        assert!(SheetFont::from_coverage(count, 0, &[]).is_err());
    }

    #[test]
    fn tall_glyphs_are_cut_at_line_height() {
        struct Tall;
        impl GlyphSource for Tall {
            fn line_height(&self) -> u32 {
                2
            }
            fn glyph(&self, _: char) -> Option<Glyph> {
                Some(Glyph {
                    width: 1,
                    height: 4,
                    advance: 1,
                    coverage: vec![0xFF; 4],
                })
            }
        }
        let mut s = Surface::new(4, 4);
        draw_text(&mut s, &Tall, "1", Point::new(0, 0), Color::WHITE);
        assert_eq!(s.bounding_rect(), Rect::new(0, 0, 1, 2));
    }
}
