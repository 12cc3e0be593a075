//! Settings edits. Each one is saved right away and applies from the next scan.

use std::path::PathBuf;

use jiff::Zoned;

use crate::model::{ColorMode, ImageFormat, Preset, ScanSettings, ScanSource};
use crate::naming;

use super::ScanController;

impl ScanController {
    /// Apply an edit, note what changed, and persist.
    fn update_settings(&self, edit: impl FnOnce(&mut ScanSettings) -> Option<String>) {
        {
            let mut inner = self.lock();
            if let Some(note) = edit(&mut inner.settings) {
                inner.activity.info(note);
            }
        }
        self.persist_settings();
    }

    /// Store the prefix as typed. It is sanitized when a scan starts.
    pub fn set_prefix(&self, prefix: &str) {
        self.update_settings(|s| {
            s.prefix = prefix.trim().to_string();
            None
        });
    }

    pub fn set_output_dir(&self, dir: &str) {
        self.update_settings(|s| {
            s.output_dir = PathBuf::from(dir.trim());
            Some(format!("Output dir: {}", s.output_dir.display()))
        });
    }

    pub fn set_format(&self, format: ImageFormat) {
        self.update_settings(|s| {
            s.format = format;
            Some(format!("Format: {}", format.as_str().to_uppercase()))
        });
    }

    pub fn set_resolution(&self, dpi: u32) {
        self.update_settings(|s| {
            s.resolution_dpi = dpi;
            Some(format!("Resolution: {dpi} DPI"))
        });
    }

    pub fn set_mode(&self, mode: ColorMode) {
        self.update_settings(|s| {
            s.mode = mode;
            Some(format!("Mode: {}", mode.label()))
        });
    }

    pub fn set_source(&self, source: ScanSource) {
        self.update_settings(|s| {
            s.source = source;
            Some(format!("Source: {}", source.label()))
        });
    }

    /// Stored as typed; a malformed value fails the next scan, not this edit.
    pub fn set_extra_args(&self, extra: &str) {
        self.update_settings(|s| {
            s.extra_args = extra.trim().to_string();
            None
        });
    }

    pub fn toggle_advanced(&self) {
        self.update_settings(|s| {
            s.advanced_visible = !s.advanced_visible;
            None
        });
    }

    pub fn toggle_auto_continue(&self) {
        self.update_settings(|s| {
            s.auto_continue_on_single_device = !s.auto_continue_on_single_device;
            let state = if s.auto_continue_on_single_device { "On" } else { "Off" };
            Some(format!("Auto-continue: {state}"))
        });
    }

    pub fn cycle_format(&self) {
        self.update_settings(|s| {
            s.format = s.format.next();
            Some(format!("Format: {}", s.format.as_str().to_uppercase()))
        });
    }

    pub fn cycle_resolution(&self) {
        self.update_settings(|s| {
            s.cycle_resolution();
            Some(format!("Resolution: {} DPI", s.resolution_dpi))
        });
    }

    pub fn cycle_source(&self) {
        self.update_settings(|s| {
            s.source = s.source.next();
            Some(format!("Source: {}", s.source.label()))
        });
    }

    pub fn toggle_gray(&self) {
        self.update_settings(|s| {
            s.toggle_gray();
            Some(format!("Mode: {}", s.mode.label()))
        });
    }

    pub fn apply_preset(&self, preset: Preset) {
        self.update_settings(|s| {
            preset.apply(s);
            Some(format!("Preset: {}", preset.label()))
        });
    }

    /// Use today's date (`YYYYMMDD`) as the prefix.
    pub fn use_date_prefix(&self) {
        let today = Zoned::now().date();
        self.update_settings(|s| {
            s.prefix = naming::date_prefix(today);
            Some(format!("Prefix: {}", s.prefix))
        });
    }

    /// Write into a `YYYY-MM-DD` folder for today under the current output dir.
    pub fn use_date_dir(&self) {
        let today = Zoned::now().date();
        self.update_settings(|s| {
            let base = if s.output_dir.as_os_str().is_empty() {
                PathBuf::from("./scans")
            } else {
                s.output_dir.clone()
            };
            s.output_dir = naming::dated_dir(&base, today);
            Some(format!("Output dir: {}", s.output_dir.display()))
        });
    }
}
