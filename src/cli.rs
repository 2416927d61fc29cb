// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Taking photos (test pattern or image file as the sensor)
//! - Showing the latest gallery photo
//! - Printing the effective configuration

use pocket_camera::app::{CameraController, PermissionStatus};
use pocket_camera::backends::camera::{
    CameraBackend, DisplayTarget, FileSourceBackend, SensorRotation, TestPatternBackend,
};
use pocket_camera::config::Config;
use pocket_camera::errors::AppResult;
use pocket_camera::storage::GalleryRecord;
use std::path::{Path, PathBuf};

/// Display id used for the CLI's headless "surface"
const CLI_DISPLAY_ID: u64 = 1;

/// Take a photo and save it to the gallery
pub fn take_photo(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    rotation: i32,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rotation = SensorRotation::from_degrees(rotation)
        .ok_or_else(|| format!("Unsupported rotation {}° (use 0, 90, 180 or 270)", rotation))?;

    let mut config = Config::load(config_path)?;
    if let Some(dir) = output {
        config.gallery_dir = Some(dir);
    }

    let backend: Box<dyn CameraBackend> = match source {
        Some(path) => {
            println!("Using source file: {}", path.display());
            Box::new(FileSourceBackend::new(path).with_rotation(rotation))
        }
        None => {
            println!("Using test pattern");
            Box::new(TestPatternBackend::new().with_rotation(rotation))
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    let record: AppResult<GalleryRecord> = rt.block_on(async {
        let controller = CameraController::new(backend, &config);
        let target = DisplayTarget::new(CLI_DISPLAY_ID, 0, 0);

        controller
            .initialize(target, PermissionStatus::Granted)
            .await?;
        println!("Capturing...");
        controller.take_picture().await
    });

    print_record("Photo saved", &record?);
    Ok(())
}

/// Show the newest photo in the gallery
pub fn show_latest(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    let gallery = config.gallery_dir();

    let rt = tokio::runtime::Runtime::new()?;
    let latest = rt.block_on(async {
        CameraController::new(Box::new(TestPatternBackend::new()), &config)
            .latest_photo()
            .await
    });

    match latest {
        Some(record) => print_record("Latest photo", &record),
        None => println!("No photos in {}", gallery.display()),
    }
    Ok(())
}

/// Print the effective configuration as JSON
pub fn show_config(
    config_path: Option<&Path>,
    write: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("Gallery: {}", config.gallery_dir().display());

    if write {
        config.save(config_path)?;
        println!("Config written");
    }
    Ok(())
}

fn print_record(label: &str, record: &GalleryRecord) {
    println!("{}: {}", label, record.path.display());
    println!("  URI:  {}", record.uri);
    println!(
        "  Size: {}x{} ({} bytes, {})",
        record.width, record.height, record.size_bytes, record.mime_type
    );
}
