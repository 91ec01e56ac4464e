// src/config.rs
// Runtime settings, optionally remembered between runs

use crate::error::AppError;
use crate::ytdlp::DEFAULT_YTDLP;
use colored::*;
use dirs_next as dirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "queueloader";
const SETTINGS_FILE: &str = "settings.json";

/// User-adjustable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder downloads are written to; unset until the user picks one
    pub destination: Option<PathBuf>,
    /// yt-dlp executable name or path
    pub ytdlp_path: String,
    /// Per-download time limit in seconds; unset or zero disables it
    pub download_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            destination: None,
            ytdlp_path: DEFAULT_YTDLP.to_string(),
            download_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Location of the settings file under the local data directory
    pub fn default_path() -> Result<PathBuf, AppError> {
        let mut path = dirs::data_local_dir().ok_or_else(|| {
            AppError::ConfigError("Could not find local data directory".to_string())
        })?;
        path.push(APP_DIR);
        path.push(SETTINGS_FILE);
        Ok(path)
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        debug!("Settings loaded from {:?}", path);
        Ok(settings)
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Apply command-line overrides on top of the stored values
    pub fn apply_overrides(
        &mut self,
        destination: Option<&str>,
        ytdlp_path: Option<&str>,
        timeout_secs: Option<u64>,
    ) {
        if let Some(dir) = destination {
            self.destination = Some(PathBuf::from(dir));
        }
        if let Some(program) = ytdlp_path {
            self.ytdlp_path = program.to_string();
        }
        if timeout_secs.is_some() {
            self.download_timeout_secs = timeout_secs;
        }
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Make sure a chosen destination folder exists
pub fn prepare_destination(dir: &Path) -> Result<PathBuf, AppError> {
    if dir.as_os_str().is_empty() {
        return Err(AppError::ValidationError(
            "Destination folder must not be empty".to_string(),
        ));
    }

    if !dir.exists() {
        fs::create_dir_all(dir)?;
        println!("{} {:?}", "Created directory:".green(), dir);
    } else if !dir.is_dir() {
        return Err(AppError::ConfigError(format!("{:?} is not a directory", dir)));
    }

    Ok(dir.to_path_buf())
}
