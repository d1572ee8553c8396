//! Pictures that tell the time. A file whose name starts with `HHMM` is shown
//! for that minute; minutes without a picture show the analog clock.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use image::imageops::FilterType;
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::AssetError;
use crate::geometry::{Point, Rect};
use crate::surface::{Canvas, Color, Surface};

pub const EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Hour and minute as `HHMM`, e.g. 1615.
    pub clock4: u32,
    pub path: PathBuf,
}

/// The four leading digits of `name` as `HHMM`, if they form a valid time.
pub fn clock4_from_name(name: &str) -> Option<u32> {
    let prefix = name.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = prefix[..2].parse().ok()?;
    let minute: u32 = prefix[2..].parse().ok()?;
    (hour < 24 && minute < 60).then_some(hour * 100 + minute)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files sorted by the minute they show.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<ImageEntry>,
    rejected: Vec<PathBuf>,
}

impl Catalog {
    /// Walks `dir` recursively and catalogs every image file in it.
    pub fn scan(dir: &Path) -> Result<Self, AssetError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| AssetError::Walk {
                path: dir.to_owned(),
                source: e,
            })?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        let catalog = Self::from_paths(paths);
        info!(
            "{} clock images in {}, {} with unusable names",
            catalog.entries.len(),
            dir.display(),
            catalog.rejected.len()
        );
        Ok(catalog)
    }

    /// Non-image files are ignored; images without an `HHMM` prefix are
    /// kept aside as rejected.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut catalog = Self::default();
        for path in paths.into_iter().filter(|p| is_image(p)) {
            let clock4 = path.file_name().and_then(|n| n.to_str()).and_then(clock4_from_name);
            match clock4 {
                Some(clock4) => catalog.entries.push(ImageEntry { clock4, path }),
                None => catalog.rejected.push(path),
            }
        }
        catalog
            .entries
            .sort_by(|a, b| a.clock4.cmp(&b.clock4).then_with(|| a.path.cmp(&b.path)));
        catalog.rejected.sort();
        catalog
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn rejected(&self) -> &[PathBuf] {
        &self.rejected
    }

    /// Every image for `clock4`.
    pub fn matches(&self, clock4: u32) -> &[ImageEntry] {
        let start = self.entries.partition_point(|e| e.clock4 < clock4);
        let end = self.entries.partition_point(|e| e.clock4 <= clock4);
        &self.entries[start..end]
    }

    /// What to show during the minute of `now`. Several pictures for one
    /// minute take turns by day of the month.
    pub fn view_for(&self, now: &NaiveDateTime) -> MinuteView {
        let found = self.matches(now.hour() * 100 + now.minute());
        if found.is_empty() {
            return MinuteView::Clock;
        }
        let pick = now.day0() as usize % found.len();
        MinuteView::Image(found[pick].path.clone())
    }

    /// Minutes of `hour`, or of the whole day for `None`, that have no
    /// picture, as `HHMM`.
    pub fn missing(&self, hour: Option<u32>) -> Vec<u32> {
        let hours = match hour {
            Some(h) => h..h + 1,
            None => 0..24,
        };
        hours
            .flat_map(|h| (0..60).map(move |m| h * 100 + m))
            .filter(|&clock4| self.matches(clock4).is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinuteView {
    Clock,
    Image(PathBuf),
}

/// Decodes `path` and stretches it over a black `side × side` square.
pub fn load_square(path: &Path, side: u32) -> Result<Surface, AssetError> {
    let decoded = image::open(path).map_err(|e| AssetError::Decode {
        path: path.to_owned(),
        source: e,
    })?;
    let scaled = decoded.resize_exact(side, side, FilterType::Triangle).into_rgba8();
    let picture = Surface::from_rgba(side, side, scaled.into_raw());
    let mut square = Surface::filled(side, side, Color::BLACK);
    square.blit(&picture, Point::new(0, 0), picture.bounds());
    Ok(square)
}

/// Tracks which picture, if any, covers the clock region this minute.
#[derive(Debug)]
pub struct Showcase {
    catalog: Catalog,
    side: u32,
    minute: Option<u32>,
    picture: Option<Surface>,
}

impl Showcase {
    pub fn new(catalog: Catalog, side: u32) -> Self {
        Self {
            catalog,
            side,
            minute: None,
            picture: None,
        }
    }

    /// The picture for the current minute; `None` means the clock.
    pub fn picture(&self) -> Option<&Surface> {
        self.picture.as_ref()
    }

    /// Re-evaluates the view at each new minute. Returns true when the
    /// region must be repainted in full because a picture appeared,
    /// changed or went away. A picture that fails to load is logged and
    /// the clock is shown instead.
    pub fn update(&mut self, now: &NaiveDateTime) -> bool {
        let clock4 = now.hour() * 100 + now.minute();
        if self.minute == Some(clock4) {
            return false;
        }
        self.minute = Some(clock4);
        let had_picture = self.picture.is_some();
        self.picture = match self.catalog.view_for(now) {
            MinuteView::Clock => None,
            MinuteView::Image(path) => match load_square(&path, self.side) {
                Ok(square) => {
                    debug!("showing {} for {:04}", path.display(), clock4);
                    Some(square)
                }
                Err(e) => {
                    warn!("{}, showing the clock instead", e);
                    None
                }
            },
        };
        had_picture || self.picture.is_some()
    }

    /// Repaints `area` (output coordinates) from the picture. Returns
    /// `None` without a picture or when `area` misses `region`.
    pub fn redraw_area(&self, target: &mut dyn Canvas, region: Rect, area: Rect) -> Option<Rect> {
        let picture = self.picture.as_ref()?;
        let area = area.intersection(&region).intersection(&target.bounds());
        if area.is_empty() {
            return None;
        }
        Some(target.blit(picture, area.origin(), area.translate(-region.x, -region.y)))
    }
}
