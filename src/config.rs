// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Loaded from `~/.config/pocket-camera/config.json`. A missing file yields
//! the defaults; a file that exists but cannot be parsed is an error.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, MIN_FREE_SPACE_BYTES, PHOTO_SAVED_DISPLAY_MS,
};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Output format for saved photos
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PhotoOutputFormat {
    /// JPEG (lossy, default)
    #[default]
    Jpeg,
    /// PNG (lossless)
    Png,
}

impl PhotoOutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PhotoOutputFormat::Jpeg => "jpg",
            PhotoOutputFormat::Png => "png",
        }
    }

    /// MIME type recorded with the gallery entry
    pub fn mime_type(self) -> &'static str {
        match self {
            PhotoOutputFormat::Jpeg => "image/jpeg",
            PhotoOutputFormat::Png => "image/png",
        }
    }

    /// Format of an existing gallery file, by extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(PhotoOutputFormat::Jpeg),
            "png" => Some(PhotoOutputFormat::Png),
            _ => None,
        }
    }
}

/// JPEG quality preset
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PhotoQuality {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

impl PhotoQuality {
    /// Quality passed to the JPEG encoder (1-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            PhotoQuality::Low => 60,
            PhotoQuality::Medium => 80,
            PhotoQuality::High => 92,
            PhotoQuality::Maximum => 98,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gallery directory (defaults to ~/Pictures/pocket-camera)
    pub gallery_dir: Option<PathBuf>,
    /// Minimum free space before a photo is written
    pub min_free_space_bytes: u64,
    /// How long the saved state is held before returning to ready
    pub photo_saved_display_ms: u64,
    /// Output format for saved photos
    pub photo_output_format: PhotoOutputFormat,
    /// JPEG quality preset
    pub photo_quality: PhotoQuality,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gallery_dir: None,
            min_free_space_bytes: MIN_FREE_SPACE_BYTES,
            photo_saved_display_ms: PHOTO_SAVED_DISPLAY_MS,
            photo_output_format: PhotoOutputFormat::default(),
            photo_quality: PhotoQuality::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: Option<&Path>) -> AppResult<()> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_config_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("{}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("serialize: {}", e)))?;
        std::fs::write(&path, json)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Effective gallery directory
    pub fn gallery_dir(&self) -> PathBuf {
        self.gallery_dir.clone().unwrap_or_else(default_gallery_dir)
    }

    /// Auto-resume delay after a photo has been saved
    pub fn photo_saved_display(&self) -> Duration {
        Duration::from_millis(self.photo_saved_display_ms)
    }
}

/// Default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Default gallery directory (~/Pictures/pocket-camera)
pub fn default_gallery_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR_NAME)
}
