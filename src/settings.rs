use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::overlay::OverlayStyle;
use crate::ramp::RampCurve;

pub const FILE_NAME: &str = "image-clock.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSection,

    #[serde(default)]
    pub analog_clock: AnalogClockSection,

    #[serde(default)]
    pub text_overlay: TextOverlaySection,

    #[serde(default)]
    pub images: ImagesSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// Frames per second of the second-hand animation.
    pub frame_rate: u32,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self { frame_rate: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogClockSection {
    /// Pixels between the clock region edge and the dial, both sides
    /// together.
    pub margin: u32,
    pub curve: RampCurve,
    pub skip_idle_hands: bool,
    /// Glyph sheet for the date box, see `SHEET_CHARS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
}

impl Default for AnalogClockSection {
    fn default() -> Self {
        Self {
            margin: 150,
            curve: RampCurve::default(),
            skip_idle_hands: false,
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlaySection {
    pub style: OverlayStyle,
    pub color: [u8; 3],
    /// Text height in percent of the clock side.
    pub size: u32,
    /// Seconds for a fading overlay to disappear.
    pub fade_time: u32,
    /// Seconds for a shifting overlay to cross its span.
    pub transition_time: u32,
}

impl Default for TextOverlaySection {
    fn default() -> Self {
        Self {
            style: OverlayStyle::default(),
            color: [128, 0, 0],
            size: 10,
            fade_time: 20,
            transition_time: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesSection {
    /// Searched recursively for `HHMM*` pictures. No directory, no pictures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Upper bound for `fade_time` and `transition_time`, in seconds.
pub const MAX_OVERLAY_TIME: u32 = 3600;

impl Settings {
    /// Load settings from a file path.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_owned(),
            source: e,
        })?;

        Self::from_str(&content, path)
    }

    /// Parse settings from a string; `path` is only used in errors.
    pub fn from_str(content: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content).map_err(|e| SettingsError::Parse {
            path: path.to_owned(),
            source: e,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Loads `explicit` if given, otherwise the first settings file found in
    /// [`search_paths`]. Falls back to defaults when nothing is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            info!("loading settings from {}", path.display());
            return Self::from_file(path);
        }
        match search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                info!("loading settings from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                warn!("no {} found, using defaults", FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string(self)?)
    }

    /// Writes these settings to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), SettingsError> {
        let content = self.to_toml()?;
        let io_err = |e| SettingsError::Io {
            path: path.to_owned(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.general.frame_rate == 0 {
            return Err(SettingsError::Invalid {
                field: "general.frame_rate",
                reason: "must be at least 1".to_string(),
            });
        }
        let size = self.text_overlay.size;
        if size == 0 || size > 100 {
            return Err(SettingsError::Invalid {
                field: "text_overlay.size",
                reason: format!("{size} is not a percentage in 1..=100"),
            });
        }
        let times = [
            ("text_overlay.fade_time", self.text_overlay.fade_time),
            ("text_overlay.transition_time", self.text_overlay.transition_time),
        ];
        for (field, seconds) in times {
            if seconds > MAX_OVERLAY_TIME {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{seconds} is longer than {MAX_OVERLAY_TIME} seconds"),
                });
            }
        }
        Ok(())
    }
}

/// Settings locations in lookup order.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join("image-clock").join(FILE_NAME));
    }
    paths.push(PathBuf::from("image-clock").join(FILE_NAME));
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_path() -> PathBuf {
        PathBuf::from("test/image-clock.toml")
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_str("", &test_path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.general.frame_rate, 30);
        assert_eq!(settings.analog_clock.margin, 150);
        assert_eq!(settings.text_overlay.color, [128, 0, 0]);
    }

    #[test]
    fn parse_full_settings() {
        let content = r#"
            [general]
            frame_rate = 60

            [analog_clock]
            margin = 40
            curve = "linear-hold"
            skip_idle_hands = true

            [text_overlay]
            style = "shift"
            color = [10, 20, 30]
            size = 8
            fade_time = 5
            transition_time = 12

            [images]
            directory = "/srv/clock-pictures"
        "#;

        let settings = Settings::from_str(content, &test_path()).unwrap();
        assert_eq!(settings.general.frame_rate, 60);
        assert_eq!(settings.analog_clock.margin, 40);
        assert_eq!(settings.analog_clock.curve, RampCurve::LinearHold);
        assert!(settings.analog_clock.skip_idle_hands);
        assert_eq!(settings.text_overlay.style, OverlayStyle::Shift);
        assert_eq!(settings.text_overlay.color, [10, 20, 30]);
        assert_eq!(settings.text_overlay.size, 8);
        assert_eq!(settings.text_overlay.fade_time, 5);
        assert_eq!(settings.text_overlay.transition_time, 12);
        assert_eq!(settings.images.directory, Some(PathBuf::from("/srv/clock-pictures")));
        assert_eq!(settings.analog_clock.font, None);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let content = r#"
            [analog_clock]
            margin = 0
        "#;

        let settings = Settings::from_str(content, &test_path()).unwrap();
        assert_eq!(settings.analog_clock.margin, 0);
        assert_eq!(settings.analog_clock.curve, RampCurve::default());
        assert_eq!(settings.general.frame_rate, 30);
    }

    #[test]
    fn zero_frame_rate_fails() {
        let content = r#"
            [general]
            frame_rate = 0
        "#;

        let result = Settings::from_str(content, &test_path());
        assert!(matches!(
            result,
            Err(SettingsError::Invalid { field: "general.frame_rate", .. })
        ));
    }

    #[test]
    fn oversized_text_fails() {
        let content = r#"
            [text_overlay]
            size = 140
        "#;

        let result = Settings::from_str(content, &test_path());
        assert!(matches!(
            result,
            Err(SettingsError::Invalid { field: "text_overlay.size", .. })
        ));
    }

    #[test]
    fn overlong_fade_fails() {
        let content = r#"
            [text_overlay]
            fade_time = 700000
        "#;

        let result = Settings::from_str(content, &test_path());
        assert!(matches!(
            result,
            Err(SettingsError::Invalid { field: "text_overlay.fade_time", .. })
        ));

        let mut settings = Settings::default();
        settings.text_overlay.transition_time = MAX_OVERLAY_TIME + 1;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "text_overlay.transition_time", .. })
        ));
        settings.text_overlay.transition_time = MAX_OVERLAY_TIME;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn unknown_curve_fails() {
        let content = r#"
            [analog_clock]
            curve = "pendulum"
        "#;

        let result = Settings::from_str(content, &test_path());
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn written_defaults_read_back() {
        let text = Settings::default().to_toml().unwrap();
        assert!(text.contains("[analog_clock]"));
        assert!(!text.contains("directory"));
        let back = Settings::from_str(&text, &test_path()).unwrap();
        assert_eq!(back, Settings::default());

        let mut custom = Settings::default();
        custom.images.directory = Some(PathBuf::from("pictures"));
        custom.analog_clock.font = Some(PathBuf::from("digits.png"));
        let back = Settings::from_str(&custom.to_toml().unwrap(), &test_path()).unwrap();
        assert_eq!(back, custom);
    }

    #[test]
    fn search_order_ends_in_working_directory() {
        let paths = search_paths();
        assert_eq!(paths.last(), Some(&PathBuf::from(FILE_NAME)));
        assert!(paths.contains(&PathBuf::from("image-clock").join(FILE_NAME)));
    }
}
