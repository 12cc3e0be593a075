//! Settings storage: load with defaults, save by atomic replace.

use std::fs;

use tracing::{debug, warn};

use crate::model::ScanSettings;

use super::{Result, Storage};

impl Storage {
    /// Loads settings, falling back to defaults.
    ///
    /// A missing file is normal on first run. An unreadable or malformed file
    /// is logged and replaced by defaults on the next save.
    pub fn load_settings(&self) -> ScanSettings {
        match self.try_load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!(path = %self.settings_path().display(), "no settings file, using defaults");
                ScanSettings::default()
            }
            Err(e) => {
                warn!(path = %self.settings_path().display(), error = %e, "ignoring unreadable settings");
                ScanSettings::default()
            }
        }
    }

    /// Loads settings, or `None` if no settings file exists yet.
    pub fn try_load_settings(&self) -> Result<Option<ScanSettings>> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(toml::from_str(&contents)?))
    }

    /// Saves settings, logging instead of failing.
    pub fn save_settings(&self, settings: &ScanSettings) {
        if let Err(e) = self.try_save_settings(settings) {
            warn!(path = %self.settings_path().display(), error = %e, "failed to save settings");
        }
    }

    /// Writes settings to a temporary file and renames it into place,
    /// so readers never see a half-written file. Last writer wins.
    pub fn try_save_settings(&self, settings: &ScanSettings) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(settings)?;
        let tmp = self.root.join(format!(".settings.toml.{}", std::process::id()));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, self.settings_path())?;
        Ok(())
    }
}
