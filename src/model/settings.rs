//! Scan settings: the one record the operator edits.
//!
//! Persisted as a flat TOML table. Every field has a default so a partial or
//! older file still loads; unknown keys are ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolutions the DPI cycle steps through.
pub const RESOLUTION_PRESETS: [u32; 3] = [150, 300, 600];

/// Output image format, passed to the scanner as `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Pdf,
    Pnm,
}

impl ImageFormat {
    pub const ALL: [Self; 5] = [Self::Png, Self::Jpeg, Self::Tiff, Self::Pdf, Self::Pnm];

    /// The name the scanner program expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Tiff => "tiff",
            Self::Pdf => "pdf",
            Self::Pnm => "pnm",
        }
    }

    /// File extension for output files. Only JPEG differs from the format name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    /// The next format in the cycle, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Colour mode. `Unspecified` leaves the choice to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "")]
    Unspecified,
    #[default]
    Color,
    Gray,
    Lineart,
}

impl ColorMode {
    /// Value for `--mode`, or `None` to omit the argument.
    pub fn as_arg(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Color => Some("Color"),
            Self::Gray => Some("Gray"),
            Self::Lineart => Some("Lineart"),
        }
    }

    pub fn label(self) -> &'static str {
        self.as_arg().unwrap_or("Default")
    }
}

/// Paper source. `Unspecified` leaves the choice to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanSource {
    #[serde(rename = "")]
    Unspecified,
    #[default]
    Flatbed,
    #[serde(rename = "ADF")]
    Adf,
    #[serde(rename = "ADF Duplex")]
    AdfDuplex,
}

impl ScanSource {
    pub const ALL: [Self; 4] = [Self::Unspecified, Self::Flatbed, Self::Adf, Self::AdfDuplex];

    /// Value for `--source`, or `None` to omit the argument.
    pub fn as_arg(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Flatbed => Some("Flatbed"),
            Self::Adf => Some("ADF"),
            Self::AdfDuplex => Some("ADF Duplex"),
        }
    }

    pub fn label(self) -> &'static str {
        self.as_arg().unwrap_or("Default")
    }

    /// The next source in the cycle, wrapping back to `Unspecified`.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Everything the operator can configure about a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanSettings {
    /// Base name for output files. Sanitized before use.
    pub prefix: String,

    /// Directory scans are written to. `~` is expanded.
    pub output_dir: PathBuf,

    pub format: ImageFormat,

    /// Zero lets the device pick its own resolution.
    pub resolution_dpi: u32,

    pub mode: ColorMode,

    pub source: ScanSource,

    /// Extra scanner arguments, split with shell quoting rules.
    pub extra_args: String,

    /// Device chosen last session; preselected when it shows up again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_device_id: Option<String>,

    /// Whether the advanced options panel is shown.
    pub advanced_visible: bool,

    /// Skip device selection when exactly one scanner is found.
    pub auto_continue_on_single_device: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            prefix: "scan".to_string(),
            output_dir: PathBuf::from("./scans"),
            format: ImageFormat::Png,
            resolution_dpi: 300,
            mode: ColorMode::Color,
            source: ScanSource::Flatbed,
            extra_args: String::new(),
            last_device_id: None,
            advanced_visible: false,
            auto_continue_on_single_device: true,
        }
    }
}

impl ScanSettings {
    /// Step the resolution through the presets. Off-preset values restart the cycle.
    pub fn cycle_resolution(&mut self) {
        self.resolution_dpi = match RESOLUTION_PRESETS
            .iter()
            .position(|r| *r == self.resolution_dpi)
        {
            Some(idx) => RESOLUTION_PRESETS[(idx + 1) % RESOLUTION_PRESETS.len()],
            None => RESOLUTION_PRESETS[0],
        };
    }

    /// Flip between Gray and Color. Anything that isn't Gray becomes Gray.
    pub fn toggle_gray(&mut self) {
        self.mode = if self.mode == ColorMode::Gray {
            ColorMode::Color
        } else {
            ColorMode::Gray
        };
    }
}

/// Named combinations of resolution, mode, and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Document,
    Photo,
    Draft,
}

impl Preset {
    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "Doc (300dpi Gray PNG)",
            Self::Photo => "Photo (600dpi Color PNG)",
            Self::Draft => "Draft (150dpi Gray PNG)",
        }
    }

    pub fn apply(self, settings: &mut ScanSettings) {
        let (dpi, mode) = match self {
            Self::Document => (300, ColorMode::Gray),
            Self::Photo => (600, ColorMode::Color),
            Self::Draft => (150, ColorMode::Gray),
        };
        settings.resolution_dpi = dpi;
        settings.mode = mode;
        settings.format = ImageFormat::Png;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = ScanSettings::default();
        assert_eq!(s.prefix, "scan");
        assert_eq!(s.output_dir, PathBuf::from("./scans"));
        assert_eq!(s.format, ImageFormat::Png);
        assert_eq!(s.resolution_dpi, 300);
        assert_eq!(s.mode, ColorMode::Color);
        assert_eq!(s.source, ScanSource::Flatbed);
        assert!(s.auto_continue_on_single_device);
        assert!(!s.advanced_visible);
    }

    #[test]
    fn jpeg_uses_jpg_extension() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Tiff.extension(), "tiff");
    }

    #[test]
    fn format_cycle_wraps() {
        assert_eq!(ImageFormat::Png.next(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::Pnm.next(), ImageFormat::Png);
    }

    #[test]
    fn source_cycle_includes_unspecified() {
        assert_eq!(ScanSource::AdfDuplex.next(), ScanSource::Unspecified);
        assert_eq!(ScanSource::Unspecified.next(), ScanSource::Flatbed);
    }

    #[test]
    fn resolution_cycle_restarts_off_preset() {
        let mut s = ScanSettings {
            resolution_dpi: 600,
            ..ScanSettings::default()
        };
        s.cycle_resolution();
        assert_eq!(s.resolution_dpi, 150);

        s.resolution_dpi = 1200;
        s.cycle_resolution();
        assert_eq!(s.resolution_dpi, 150);
    }

    #[test]
    fn toggle_gray_from_lineart_goes_gray() {
        let mut s = ScanSettings {
            mode: ColorMode::Lineart,
            ..ScanSettings::default()
        };
        s.toggle_gray();
        assert_eq!(s.mode, ColorMode::Gray);
        s.toggle_gray();
        assert_eq!(s.mode, ColorMode::Color);
    }

    #[test]
    fn presets_force_png() {
        let mut s = ScanSettings {
            format: ImageFormat::Pdf,
            ..ScanSettings::default()
        };
        Preset::Photo.apply(&mut s);
        assert_eq!(s.format, ImageFormat::Png);
        assert_eq!(s.resolution_dpi, 600);
        assert_eq!(s.mode, ColorMode::Color);
    }

    #[test]
    fn empty_strings_mean_unspecified() {
        let s: ScanSettings = toml::from_str("mode = \"\"\nsource = \"ADF Duplex\"\n").unwrap();
        assert_eq!(s.mode, ColorMode::Unspecified);
        assert_eq!(s.source, ScanSource::AdfDuplex);
        assert_eq!(s.prefix, "scan");
    }
}
