use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use error_stack::{IntoReport, Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::normalizer::TextEncoding;
use crate::schema::TrackField;

const CONFIG_DIR: &str = ".playlist_dl_config";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug)]
pub struct ConfigError;

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Config error")
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = error_stack::Result<T, ConfigError>;

/// Seconds to wait after each download, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_secs: 5,
            max_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub program: String,
    pub audio_format: String,
    pub timeout_secs: u64,
}

impl DownloaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub retained_fields: Vec<TrackField>,
    pub text_encodings: Vec<TextEncoding>,
    pub output_root: PathBuf,
    pub delay_range: DelayRange,
    pub downloader: DownloaderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retained_fields: TrackField::default_retained(),
            text_encodings: vec![TextEncoding::Utf8, TextEncoding::Utf16],
            output_root: PathBuf::from("downloads"),
            delay_range: DelayRange::default(),
            downloader: DownloaderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn get_config_file_path() -> ConfigResult<PathBuf> {
        dirs::home_dir()
            .ok_or(ConfigError)
            .into_report()
            .attach_printable("Failed to find the home directory")
            .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Reads the config file, falling back to the defaults when there is none.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::get_config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .into_report()
            .attach_printable(format!("Failed to read config file at {}", path.display()))
            .change_context(ConfigError)?;
        let config: AppConfig = serde_json::from_str(&content)
            .into_report()
            .attach_printable(format!(
                "Failed to parse the config file at {}. Ensure it is valid JSON.",
                path.display()
            ))
            .change_context(ConfigError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let serialized = serde_json::to_string_pretty(self)
            .into_report()
            .attach_printable("Failed to serialize the configuration to JSON")
            .change_context(ConfigError)?;
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)
                .into_report()
                .attach_printable(format!("Failed to create directory at {}", folder.display()))
                .change_context(ConfigError)?;
        }
        fs::write(path, serialized)
            .into_report()
            .attach_printable(format!("Failed to write config file at {}", path.display()))
            .change_context(ConfigError)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.text_encodings.is_empty() {
            return Err(Report::new(ConfigError)
                .attach_printable("text_encodings must list at least one encoding"));
        }
        if self.downloader.program.trim().is_empty() {
            return Err(Report::new(ConfigError).attach_printable("downloader.program is empty"));
        }
        if self.downloader.audio_format.trim().is_empty() {
            return Err(
                Report::new(ConfigError).attach_printable("downloader.audio_format is empty")
            );
        }
        Ok(())
    }
}
