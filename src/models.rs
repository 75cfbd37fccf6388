use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// User-editable options that feed the gallery-dl command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub download_path: String,
    #[serde(skip)]
    pub url: String,
    pub username: String,
    // Kept in memory only.
    #[serde(skip)]
    pub password: String,
    #[serde(rename = "cookies_file")]
    pub cookies_file_path: String,
    #[serde(rename = "config_file")]
    pub config_file_path: String,
    pub url_history: Vec<String>,
    #[serde(rename = "extract_links")]
    pub extract_links_only: bool,
    pub no_download: bool,
    #[serde(rename = "write_info")]
    pub write_info_json: bool,
    pub write_metadata: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_path: default_download_path().to_string_lossy().to_string(),
            url: String::new(),
            username: String::new(),
            password: String::new(),
            cookies_file_path: String::new(),
            config_file_path: String::new(),
            url_history: Vec::new(),
            extract_links_only: false,
            no_download: false,
            write_info_json: false,
            write_metadata: false,
        }
    }
}

impl Settings {
    /// Appends `url` unless it is empty or already recorded. Returns whether
    /// the history changed.
    pub fn add_url_to_history(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.url_history.iter().any(|known| known == url) {
            return false;
        }
        self.url_history.push(url.to_string());
        true
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}

pub fn default_download_path() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join("gallery-dl")
}

/// What the controller is currently busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Testing,
    Downloading,
}

/// Messages flowing from background work to the interface, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Log(String),
    StatusChanged(String),
    TestFinished,
    DownloadStarted,
    DownloadFinished,
    Error(String),
}

impl AppEvent {
    pub fn log(text: impl Into<String>) -> Self {
        Self::Log(text.into())
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::StatusChanged(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }
}
