use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::Rect;

/// Invalid timepiece configuration, reported at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("clock region must be square, got {width}x{height}")]
    NonSquareRegion { width: i32, height: i32 },

    #[error("clock region {region:?} does not fit a {width}x{height} target")]
    RegionOutsideTarget { region: Rect, width: u32, height: u32 },

    #[error("frame rate must be a positive integer")]
    ZeroFrameRate,

    #[error("margin {margin} leaves no room in a {side}px clock")]
    MarginTooLarge { margin: u32, side: u32 },
}

/// Errors loading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures reading images and glyph sheets from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unusable glyph sheet {path}: {reason}")]
    BadSheet { path: PathBuf, reason: String },
}

/// Anything that stops the application from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create framebuffer: {0}")]
    Pixels(#[from] pixels::Error),
}
