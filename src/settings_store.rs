use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::models::Settings;

const SETTINGS_FILE_NAME: &str = ".gallery-dl-gui-settings.json";

/// Loads and saves [`Settings`] as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.gallery-dl-gui-settings.json`
    pub fn in_home_dir() -> Result<Self, SettingsError> {
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDirectory)?;
        Ok(Self::new(home.join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files give the defaults.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "failed to load settings from {}: {}",
                    self.path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Settings, SettingsError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;
        log::debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}
